// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod audio;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use sdr_audio_app::{init_logging, ConfigFile};
use sdr_audio_backend::ReaderSource;
use sdr_audio_core::freq::{format_frequency, parse_frequency};
use sdr_audio_core::meter::meter_for;
use sdr_audio_core::{
    ChannelRouting, Controller, DynResult, ExitReason, PipelineParams, SampleSource, Shutdown,
    SourceError,
};

use audio::CpalSink;
use config::{AppConfig, SourceKind};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - RTL-SDR AM receiver");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Centre frequency in Hz (k, M and G suffixes accepted)
    #[arg(short = 'f', long = "frequency", value_parser = parse_frequency)]
    frequency: Option<u64>,
    /// Device index or SoapySDR args string
    #[arg(short = 'd', long = "device")]
    device: Option<String>,
    /// Tuner gain in dB, 0 for automatic
    #[arg(short = 'g', long = "gain")]
    gain: Option<f64>,
    /// Frequency correction in ppm
    #[arg(short = 'p', long = "ppm", allow_negative_numbers = true)]
    ppm: Option<i32>,
    /// Output channel: both, left, right (or 0, 1, 2)
    #[arg(short = 'c', long = "channel")]
    channel: Option<ChannelRouting>,
    /// Replay an unsigned 8-bit I/Q capture instead of using hardware ("-" for stdin)
    #[arg(long = "input", value_name = "FILE")]
    input: Option<PathBuf>,
    /// Pace --input playback at the SDR sample rate
    #[arg(long = "realtime")]
    realtime: bool,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(freq) = self.frequency {
            cfg.sdr.frequency_hz = Some(freq);
        }
        if let Some(device) = self.device {
            cfg.sdr.device = device;
        }
        if let Some(gain) = self.gain {
            cfg.sdr.gain_db = gain;
        }
        if let Some(ppm) = self.ppm {
            cfg.sdr.ppm = ppm;
        }
        if let Some(routing) = self.channel {
            cfg.audio.routing = routing;
        }
        if let Some(input) = self.input {
            cfg.sdr.source = SourceKind::File;
            cfg.sdr.input = Some(input);
        }
        if self.realtime {
            cfg.sdr.realtime = true;
        }
        if let Some(level) = self.log_level {
            cfg.general.log_level = Some(level);
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<ExitCode> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", AppConfig::example_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let (mut cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = AppConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        AppConfig::load_from_default_paths()?
    };
    cli.apply(&mut cfg);
    cfg.validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let shutdown = Shutdown::new();
    let worker_shutdown = shutdown.clone();
    let mut worker = tokio::task::spawn_blocking(move || run_pipeline(&cfg, worker_shutdown));

    let joined = tokio::select! {
        res = &mut worker => res,
        sig = wait_for_signal() => {
            match sig {
                Ok(name) => {
                    info!("Signal caught ({}), exiting", name);
                    shutdown.request_shutdown();
                }
                Err(e) => warn!("Signal handling unavailable: {}", e),
            }
            worker.await
        }
    };

    let reason = joined??;
    if reason.is_success() {
        info!("Exiting: {}", reason);
    } else {
        error!("Exiting: {}", reason);
    }
    Ok(exit_code(&reason))
}

/// Open the source and sink, then stream until shutdown. Runs on a blocking
/// thread; the audio stream never leaves it.
fn run_pipeline(cfg: &AppConfig, shutdown: Shutdown) -> DynResult<ExitReason> {
    let params = PipelineParams::from_rates(
        cfg.sdr.sample_rate,
        cfg.audio.sample_rate,
        cfg.audio.frames_per_buffer,
        cfg.audio.channels as usize,
        cfg.audio.routing,
    )?;

    let source = open_source(cfg)?;
    let sink = CpalSink::open(&cfg.audio)?;
    let controller = Controller::new(source, sink, params, meter_for(cfg.meter.mode), shutdown)?;
    Ok(controller.run())
}

fn open_source(cfg: &AppConfig) -> Result<Box<dyn SampleSource>, SourceError> {
    match cfg.sdr.source {
        SourceKind::File => {
            let path = cfg
                .sdr
                .input
                .as_deref()
                .ok_or_else(|| SourceError::Config("no input file given".into()))?;
            let source = ReaderSource::open(path)?;
            if cfg.sdr.realtime {
                info!(
                    "Reading I/Q samples from {}, paced at {} S/s",
                    source.label(),
                    cfg.sdr.sample_rate
                );
                Ok(Box::new(source.paced(cfg.sdr.sample_rate)))
            } else {
                info!("Reading I/Q samples from {}", source.label());
                Ok(Box::new(source))
            }
        }
        SourceKind::Soapysdr => open_soapysdr(cfg),
    }
}

#[cfg(feature = "soapysdr")]
fn open_soapysdr(cfg: &AppConfig) -> Result<Box<dyn SampleSource>, SourceError> {
    use sdr_audio_backend::{DeviceSelector, SoapySource, TunerSettings};

    let device: DeviceSelector = cfg.sdr.device.parse().map_err(SourceError::Config)?;
    let settings = TunerSettings {
        device,
        center_freq_hz: cfg.sdr.frequency_hz.unwrap_or_default(),
        sample_rate_hz: cfg.sdr.sample_rate,
        gain_db: cfg.sdr.gain_db,
        ppm: cfg.sdr.ppm,
    };
    info!(
        "Tuning device {} to {} at {} S/s, gain {}",
        settings.device,
        format_frequency(settings.center_freq_hz),
        settings.sample_rate_hz,
        if settings.auto_gain() {
            "auto".to_string()
        } else {
            format!("{:.1} dB", settings.gain_db)
        }
    );
    Ok(Box::new(SoapySource::open(&settings)?))
}

#[cfg(not(feature = "soapysdr"))]
fn open_soapysdr(cfg: &AppConfig) -> Result<Box<dyn SampleSource>, SourceError> {
    let freq = cfg.sdr.frequency_hz.unwrap_or_default();
    Err(SourceError::Config(format!(
        "cannot tune {}: built without SoapySDR support (use --input)",
        format_frequency(freq)
    )))
}

/// Resolve once SIGINT, SIGTERM or SIGQUIT arrives.
async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        let mut quit = signal(SignalKind::quit())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
            _ = term.recv() => Ok("SIGTERM"),
            _ = quit.recv() => Ok("SIGQUIT"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}

fn exit_code(reason: &ExitReason) -> ExitCode {
    ExitCode::from(exit_status(reason))
}

fn exit_status(reason: &ExitReason) -> u8 {
    reason.exit_code().clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_audio_core::SinkError;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "sdr-audio",
            "-f",
            "118.1M",
            "-d",
            "driver=rtlsdr,serial=0001",
            "-g",
            "28",
            "-p",
            "-3",
            "-c",
            "right",
        ]);
        let mut cfg = AppConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.sdr.frequency_hz, Some(118_100_000));
        assert_eq!(cfg.sdr.device, "driver=rtlsdr,serial=0001");
        assert_eq!(cfg.sdr.gain_db, 28.0);
        assert_eq!(cfg.sdr.ppm, -3);
        assert_eq!(cfg.audio.routing, ChannelRouting::Right);
        assert_eq!(cfg.sdr.source, SourceKind::Soapysdr);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn input_switches_to_file_source() {
        let cli = Cli::parse_from(["sdr-audio", "--input", "-", "--realtime", "-c", "1"]);
        let mut cfg = AppConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.sdr.source, SourceKind::File);
        assert_eq!(cfg.sdr.input, Some(PathBuf::from("-")));
        assert!(cfg.sdr.realtime);
        assert_eq!(cfg.audio.routing, ChannelRouting::Left);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bad_frequency_is_rejected() {
        assert!(Cli::try_parse_from(["sdr-audio", "-f", "lots"]).is_err());
    }

    #[test]
    fn missing_input_file_fails_to_open() {
        let mut cfg = AppConfig::default();
        cfg.sdr.source = SourceKind::File;
        cfg.sdr.input = Some(PathBuf::from("/nonexistent/capture.cu8"));
        assert!(matches!(open_source(&cfg), Err(SourceError::Open(_))));
    }

    #[test]
    fn exit_statuses() {
        assert_eq!(exit_status(&ExitReason::UserCancel), 0);
        assert_eq!(exit_status(&ExitReason::EndOfStream), 0);
        assert_eq!(exit_status(&ExitReason::Sink(SinkError::Stalled)), 1);
        assert_eq!(
            exit_status(&ExitReason::Source(SourceError::driver(-4, "overflow"))),
            4
        );
        assert_eq!(
            exit_status(&ExitReason::Source(SourceError::driver(-1000, "odd"))),
            255
        );
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for sdr-audio.
//!
//! Config is loaded from the `[sdr-audio]` section of `sdr-audio.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./sdr-audio.toml`
//! 3. `~/.config/sdr-audio/sdr-audio.toml`
//! 4. `/etc/sdr-audio/sdr-audio.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sdr_audio_app::ConfigFile;
use sdr_audio_core::{ChannelRouting, MeterMode};

/// Top-level configuration for the sdr-audio binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub sdr: SdrConfig,
    pub audio: AudioConfig,
    pub meter: MeterConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Where raw I/Q samples come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live SoapySDR device.
    #[default]
    Soapysdr,
    /// Recorded unsigned 8-bit I/Q capture (file or stdin).
    File,
}

/// Receiver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdrConfig {
    pub source: SourceKind,
    /// Device index or SoapySDR args string.
    pub device: String,
    /// Centre frequency in Hz; required for live capture.
    pub frequency_hz: Option<u64>,
    /// Capture rate in Hz. Must be a multiple of the audio rate.
    pub sample_rate: u32,
    /// Tuner gain in dB, 0 for automatic.
    pub gain_db: f64,
    pub ppm: i32,
    /// Capture file for `source = "file"`; `-` reads stdin.
    pub input: Option<PathBuf>,
    /// Pace file playback at `sample_rate`.
    pub realtime: bool,
}

impl Default for SdrConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Soapysdr,
            device: "0".to_string(),
            frequency_hz: None,
            sample_rate: 240_000,
            gain_db: 0.0,
            ppm: 0,
            input: None,
            realtime: false,
        }
    }
}

/// Audio output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name, or `default`.
    pub device: String,
    pub sample_rate: u32,
    pub channels: u16,
    /// Audio frames produced per I/Q buffer.
    pub frames_per_buffer: usize,
    /// Target playback queue length.
    pub latency_ms: u32,
    pub routing: ChannelRouting,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate: 48_000,
            channels: 2,
            frames_per_buffer: 16_384,
            latency_ms: 500,
            routing: ChannelRouting::Both,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub mode: MeterMode,
}

impl AppConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        match self.sdr.source {
            SourceKind::Soapysdr => match self.sdr.frequency_hz {
                None => {
                    return Err(
                        "[sdr].frequency_hz is required for live capture (or pass -f)".to_string(),
                    )
                }
                Some(0) => return Err("[sdr].frequency_hz must be > 0".to_string()),
                Some(_) => {}
            },
            SourceKind::File => {
                if self.sdr.input.is_none() {
                    return Err("[sdr].input is required when [sdr].source = \"file\"".to_string());
                }
            }
        }

        if self.sdr.sample_rate == 0 {
            return Err("[sdr].sample_rate must be > 0".to_string());
        }
        if self.audio.sample_rate == 0 {
            return Err("[audio].sample_rate must be > 0".to_string());
        }
        if self.sdr.sample_rate < self.audio.sample_rate
            || self.sdr.sample_rate % self.audio.sample_rate != 0
        {
            return Err(format!(
                "[sdr].sample_rate ({}) must be a whole multiple of [audio].sample_rate ({})",
                self.sdr.sample_rate, self.audio.sample_rate
            ));
        }
        if !(1..=2).contains(&self.audio.channels) {
            return Err("[audio].channels must be 1 or 2".to_string());
        }
        if !self.audio.routing.fits(self.audio.channels as usize) {
            return Err(format!(
                "[audio].routing '{}' needs 2 channels",
                self.audio.routing
            ));
        }
        if self.audio.frames_per_buffer == 0 {
            return Err("[audio].frames_per_buffer must be > 0".to_string());
        }
        if self.audio.latency_ms == 0 {
            return Err("[audio].latency_ms must be > 0".to_string());
        }
        if self.sdr.gain_db < 0.0 {
            return Err("[sdr].gain_db must be >= 0 (0 = automatic)".to_string());
        }
        Ok(())
    }

    /// Generate an example configuration as a TOML string.
    pub fn example_toml() -> String {
        #[derive(Serialize)]
        struct Wrapper {
            #[serde(rename = "sdr-audio")]
            inner: AppConfig,
        }
        let example = AppConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            sdr: SdrConfig {
                frequency_hz: Some(118_100_000),
                ..SdrConfig::default()
            },
            audio: AudioConfig::default(),
            meter: MeterConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

impl ConfigFile for AppConfig {
    fn section_key() -> &'static str {
        "sdr-audio"
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

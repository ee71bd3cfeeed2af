// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! SoapySDR tuner source (RTL-SDR by default).

use num_complex::Complex;
use soapysdr::{Device, Direction, ErrorCode, RxStream};
use tracing::{debug, info, warn};

use sdr_audio_core::{CancelFlag, SampleSource, SourceError};

use crate::assemble::BufferAssembler;
use crate::device::{DeviceSelector, TunerSettings, DEFAULT_DRIVER};

/// Complex samples requested per stream read.
const READ_CHUNK: usize = 16_384;
/// Read timeout; a timeout only means "check the cancel flag and retry".
const READ_TIMEOUT_US: i64 = 1_000_000;
/// Tuner frequency component carrying the ppm correction.
const CORRECTION_COMPONENT: &str = "CORR";

/// Live tuner streaming unsigned 8-bit I/Q.
pub struct SoapySource {
    _device: Device,
    stream: RxStream<Complex<u8>>,
    overflows: u64,
}

impl SoapySource {
    /// Open and configure the tuner described by `settings`.
    pub fn open(settings: &TunerSettings) -> Result<Self, SourceError> {
        let device = open_device(&settings.device)?;
        configure(&device, settings)?;

        let stream = device
            .rx_stream::<Complex<u8>>(&[0])
            .map_err(|e| SourceError::Config(format!("failed to open CU8 RX stream: {}", e)))?;

        info!("SoapySDR source ready");
        Ok(Self {
            _device: device,
            stream,
            overflows: 0,
        })
    }
}

fn open_device(selector: &DeviceSelector) -> Result<Device, SourceError> {
    match selector {
        DeviceSelector::Index(idx) => {
            let found = soapysdr::enumerate(DEFAULT_DRIVER)
                .map_err(|e| SourceError::Open(format!("device enumeration failed: {}", e)))?;
            if found.is_empty() {
                return Err(SourceError::Open("no supported devices found".to_string()));
            }
            info!("Found {} device(s):", found.len());
            for (i, args) in found.iter().enumerate() {
                info!("  {}: {}", i, args);
            }
            let count = found.len();
            let args = found.into_iter().nth(*idx).ok_or_else(|| {
                SourceError::Open(format!(
                    "device index {} out of range ({} found)",
                    idx, count
                ))
            })?;
            info!("Using device #{}", idx);
            Device::new(args)
                .map_err(|e| SourceError::Open(format!("failed to open device #{}: {}", idx, e)))
        }
        DeviceSelector::Args(args) => {
            info!("Opening SoapySDR device with args: {}", args);
            Device::new(args.as_str())
                .map_err(|e| SourceError::Open(format!("failed to open device ({}): {}", args, e)))
        }
    }
}

fn configure(device: &Device, settings: &TunerSettings) -> Result<(), SourceError> {
    let rate = f64::from(settings.sample_rate_hz);
    device
        .set_sample_rate(Direction::Rx, 0, rate)
        .map_err(|e| SourceError::Config(format!("failed to set sample rate: {}", e)))?;
    let actual_rate = device.sample_rate(Direction::Rx, 0).unwrap_or(rate);
    info!(
        "Sampling at {} S/s (actual: {} S/s)",
        settings.sample_rate_hz, actual_rate
    );

    let freq = settings.center_freq_hz as f64;
    device
        .set_frequency(Direction::Rx, 0, freq, ())
        .map_err(|e| SourceError::Config(format!("failed to set frequency: {}", e)))?;
    let actual_freq = device.frequency(Direction::Rx, 0).unwrap_or(freq);
    info!(
        "Tuned to {} Hz (actual: {} Hz)",
        settings.center_freq_hz, actual_freq
    );

    if settings.auto_gain() {
        if let Err(e) = device.set_gain_mode(Direction::Rx, 0, true) {
            warn!("Failed to enable automatic gain: {}; using device default", e);
        } else {
            info!("Tuner gain set to automatic");
        }
    } else {
        if let Err(e) = device.set_gain_mode(Direction::Rx, 0, false) {
            debug!("Failed to disable automatic gain: {}", e);
        }
        device
            .set_gain(Direction::Rx, 0, settings.gain_db)
            .map_err(|e| SourceError::Config(format!("failed to set gain: {}", e)))?;
        let actual_gain = device.gain(Direction::Rx, 0).unwrap_or(settings.gain_db);
        info!(
            "Tuner gain set to {:.1} dB (actual: {:.1} dB)",
            settings.gain_db, actual_gain
        );
    }

    if settings.ppm != 0 {
        match device.set_component_frequency(
            Direction::Rx,
            0,
            CORRECTION_COMPONENT,
            f64::from(settings.ppm),
            (),
        ) {
            Ok(()) => info!("Tuner error set to {} ppm", settings.ppm),
            Err(e) => warn!("Failed to set frequency correction: {}", e),
        }
    }

    Ok(())
}

/// Negative status code matching the SoapySDR C API.
fn error_code(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::Timeout => -1,
        ErrorCode::StreamError => -2,
        ErrorCode::Corruption => -3,
        ErrorCode::Overflow => -4,
        ErrorCode::NotSupported => -5,
        ErrorCode::TimeError => -6,
        ErrorCode::Underflow => -7,
        _ => -2,
    }
}

impl SampleSource for SoapySource {
    fn read_async(
        &mut self,
        buf_len: usize,
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> Result<(), SourceError> {
        if buf_len == 0 || buf_len % 2 != 0 {
            return Err(SourceError::Config(format!(
                "raw buffer length {} must be a positive even number",
                buf_len
            )));
        }

        let mut iq = vec![Complex::new(127u8, 127u8); READ_CHUNK];
        let mut assembler = BufferAssembler::new(buf_len);

        self.stream
            .activate(None)
            .map_err(|e| SourceError::driver(error_code(e.code), e.message))?;

        let result = loop {
            if cancel.is_set() {
                break Ok(());
            }

            let n = match self.stream.read(&mut [&mut iq[..]], READ_TIMEOUT_US) {
                Ok(n) => n,
                Err(e) if matches!(e.code, ErrorCode::Timeout) => continue,
                Err(e) if matches!(e.code, ErrorCode::Overflow) => {
                    self.overflows += 1;
                    if self.overflows == 1 || self.overflows % 100 == 0 {
                        warn!("I/Q overflow, samples lost ({} so far)", self.overflows);
                    }
                    continue;
                }
                Err(e) => break Err(SourceError::driver(error_code(e.code), e.message)),
            };

            if !assembler.push(&iq[..n], cancel, on_buffer) {
                break Ok(());
            }
        };

        if assembler.pending() > 0 {
            debug!("Discarding {} bytes of unfinished I/Q buffer", assembler.pending());
        }
        if let Err(e) = self.stream.deactivate(None) {
            warn!("Failed to deactivate RX stream: {}", e);
        }
        result
    }
}

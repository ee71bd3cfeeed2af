// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

use crate::routing::ChannelRouting;

/// Errors raised by a sample source, either while opening/configuring the
/// device or from inside its delivery loop.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open sample source: {0}")]
    Open(String),

    #[error("failed to configure sample source: {0}")]
    Config(String),

    #[error("driver error {code}: {message}")]
    Driver { code: i32, message: String },

    #[error("sample source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn driver(code: i32, message: impl Into<String>) -> Self {
        SourceError::Driver {
            code,
            message: message.into(),
        }
    }

    /// Process exit status for this error. Driver codes are negative, the
    /// exit status is their magnitude.
    pub fn exit_code(&self) -> i32 {
        match self {
            SourceError::Driver { code, .. } if *code != 0 => code.saturating_abs(),
            _ => 1,
        }
    }
}

/// Errors raised by an audio sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("audio output device '{0}' not found")]
    DeviceNotFound(String),

    #[error("unsupported audio configuration: {0}")]
    Unsupported(String),

    #[error("audio write of {0} samples is not a whole number of frames")]
    Misaligned(usize),

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("audio device stopped consuming frames")]
    Stalled,
}

/// Rejected pipeline geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("decimation ratio must be >= 1")]
    ZeroRatio,

    #[error("output buffer must hold at least one frame")]
    ZeroFrames,

    #[error("unsupported channel count {0} (expected 1 or 2)")]
    Channels(usize),

    #[error("channel routing '{0}' requires a stereo output")]
    RoutingNeedsStereo(ChannelRouting),

    #[error("SDR sample rate {sdr} Hz is not a whole multiple of audio rate {audio} Hz")]
    RateNotMultiple { sdr: u32, audio: u32 },

    #[error("sink has {sink} channels, pipeline expects {expected}")]
    ChannelMismatch { sink: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_error_exit_code_is_magnitude() {
        assert_eq!(SourceError::driver(-4, "overflow").exit_code(), 4);
        assert_eq!(SourceError::driver(0, "weird").exit_code(), 1);
        assert_eq!(SourceError::driver(i32::MIN, "min").exit_code(), i32::MAX);
        assert_eq!(SourceError::Open("busy".into()).exit_code(), 1);
    }

    #[test]
    fn driver_error_display() {
        let err = SourceError::driver(-2, "stream error");
        assert_eq!(err.to_string(), "driver error -2: stream error");
    }
}

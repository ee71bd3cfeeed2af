// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;
use std::str::FromStr;

/// Driver filter used when picking a device by index.
pub const DEFAULT_DRIVER: &str = "driver=rtlsdr";

/// How to pick the tuner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Nth device reported by enumeration.
    Index(usize),
    /// Device argument string, e.g. `"driver=rtlsdr,serial=00000001"`.
    Args(String),
}

impl Default for DeviceSelector {
    fn default() -> Self {
        DeviceSelector::Index(0)
    }
}

impl FromStr for DeviceSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("device must not be empty".to_string());
        }
        Ok(match s.parse::<usize>() {
            Ok(idx) => DeviceSelector::Index(idx),
            Err(_) => DeviceSelector::Args(s.to_string()),
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Index(idx) => write!(f, "#{}", idx),
            DeviceSelector::Args(args) => f.write_str(args),
        }
    }
}

/// One-time tuner configuration applied before streaming starts.
#[derive(Debug, Clone, PartialEq)]
pub struct TunerSettings {
    pub device: DeviceSelector,
    pub center_freq_hz: u64,
    pub sample_rate_hz: u32,
    /// Gain in dB; `0.0` selects automatic gain.
    pub gain_db: f64,
    /// Frequency correction in parts per million.
    pub ppm: i32,
}

impl TunerSettings {
    pub fn auto_gain(&self) -> bool {
        self.gain_db == 0.0
    }
}

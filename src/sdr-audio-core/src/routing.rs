// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which output channel(s) carry the demodulated signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRouting {
    #[default]
    Both,
    Left,
    Right,
}

impl ChannelRouting {
    /// Numeric form used on the command line: 0 both, 1 left, 2 right.
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(ChannelRouting::Both),
            1 => Some(ChannelRouting::Left),
            2 => Some(ChannelRouting::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelRouting::Both => "both",
            ChannelRouting::Left => "left",
            ChannelRouting::Right => "right",
        }
    }

    /// Whether this routing can be honoured with `channels` output slots.
    pub fn fits(self, channels: usize) -> bool {
        match self {
            ChannelRouting::Both => channels >= 1,
            ChannelRouting::Left | ChannelRouting::Right => channels >= 2,
        }
    }

    /// Write one demodulated value into an interleaved frame.
    ///
    /// The unselected slot is silenced so nothing from a previous buffer
    /// leaks into it.
    #[inline]
    pub fn write_frame(self, frame: &mut [f32], value: f32) {
        match self {
            ChannelRouting::Both => frame.fill(value),
            ChannelRouting::Left => {
                frame.fill(0.0);
                if let Some(slot) = frame.first_mut() {
                    *slot = value;
                }
            }
            ChannelRouting::Right => {
                frame.fill(0.0);
                if let Some(slot) = frame.get_mut(1) {
                    *slot = value;
                }
            }
        }
    }
}

impl fmt::Display for ChannelRouting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelRouting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(idx) = s.parse::<u8>() {
            return Self::from_index(idx)
                .ok_or_else(|| format!("invalid channel index {} (expected 0, 1 or 2)", idx));
        }
        match s.to_ascii_lowercase().as_str() {
            "both" | "b" => Ok(ChannelRouting::Both),
            "left" | "l" => Ok(ChannelRouting::Left),
            "right" | "r" => Ok(ChannelRouting::Right),
            other => Err(format!(
                "invalid channel routing '{}' (expected both, left or right)",
                other
            )),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Best-effort peak level indication, one report per processed buffer.

use std::io::Write;

use serde::{Deserialize, Serialize};

/// Width of the terminal bar at full scale.
pub const BAR_WIDTH: usize = 30;

/// How peak levels are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterMode {
    /// Redraw a level bar in place on stderr.
    #[default]
    Bar,
    /// Emit a debug-level tracing event.
    Log,
    Off,
}

/// Receiver of per-buffer peak levels. Implementations must not fail or
/// block for long; errors are swallowed.
pub trait LevelMeter {
    fn report(&mut self, peak: f32);

    /// Called once when streaming stops.
    fn finish(&mut self) {}
}

/// Number of bar cells for a peak in `[0, 1]`.
pub fn bar_width(peak: f32) -> usize {
    (peak.clamp(0.0, 1.0) * BAR_WIDTH as f32) as usize
}

/// Terminal level bar, redrawn on a single line.
pub struct BarMeter<W: Write> {
    out: W,
    line: String,
}

impl<W: Write> BarMeter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: String::with_capacity(BAR_WIDTH + 8),
        }
    }
}

impl<W: Write> LevelMeter for BarMeter<W> {
    fn report(&mut self, peak: f32) {
        self.line.clear();
        self.line.push_str("\x1b[2K\r");
        for _ in 0..bar_width(peak) {
            self.line.push('#');
        }
        self.line.push('\r');
        let _ = self.out.write_all(self.line.as_bytes());
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        let _ = self.out.write_all(b"\x1b[2K\r");
        let _ = self.out.flush();
    }
}

pub struct LogMeter;

impl LevelMeter for LogMeter {
    fn report(&mut self, peak: f32) {
        tracing::debug!(peak, "buffer peak level");
    }
}

pub struct NoMeter;

impl LevelMeter for NoMeter {
    fn report(&mut self, _peak: f32) {}
}

/// Build the meter for `mode`. The bar goes to stderr.
pub fn meter_for(mode: MeterMode) -> Box<dyn LevelMeter> {
    match mode {
        MeterMode::Bar => Box::new(BarMeter::new(std::io::stderr())),
        MeterMode::Log => Box::new(LogMeter),
        MeterMode::Off => Box::new(NoMeter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_width_scales_and_clamps() {
        assert_eq!(bar_width(0.0), 0);
        assert_eq!(bar_width(0.5), 15);
        assert_eq!(bar_width(1.0), BAR_WIDTH);
        assert_eq!(bar_width(3.0), BAR_WIDTH);
        assert_eq!(bar_width(-1.0), 0);
    }

    #[test]
    fn bar_meter_redraws_line() {
        let mut meter = BarMeter::new(Vec::new());
        meter.report(0.1);
        meter.report(1.0);
        meter.finish();
        let text = String::from_utf8(meter.out).unwrap();
        let expected = format!(
            "\x1b[2K\r###\r\x1b[2K\r{}\r\x1b[2K\r",
            "#".repeat(BAR_WIDTH)
        );
        assert_eq!(text, expected);
    }
}

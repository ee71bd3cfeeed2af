// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

/// Parse a frequency in Hz, accepting an optional `k`, `M` or `G` suffix
/// (e.g. `"148.039M"`, `"7100k"`, `"144300000"`).
pub fn parse_frequency(input: &str) -> Result<u64, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("frequency must not be empty".to_string());
    }

    let (number, scale) = match s.char_indices().last() {
        Some((idx, 'k' | 'K')) => (&s[..idx], 1e3),
        Some((idx, 'M' | 'm')) => (&s[..idx], 1e6),
        Some((idx, 'G' | 'g')) => (&s[..idx], 1e9),
        _ => (s, 1.0),
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|e| format!("invalid frequency '{}': {}", input, e))?;
    let hz = (value * scale).round();
    if !hz.is_finite() || hz <= 0.0 || hz > u64::MAX as f64 {
        return Err(format!("frequency '{}' is out of range", input));
    }
    Ok(hz as u64)
}

/// Format a frequency for log output, e.g. `148.039000 MHz`.
pub fn format_frequency(hz: u64) -> String {
    if hz >= 1_000_000 {
        format!("{:.6} MHz", hz as f64 / 1e6)
    } else if hz >= 1_000 {
        format!("{:.3} kHz", hz as f64 / 1e3)
    } else {
        format!("{} Hz", hz)
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Boxcar decimation and AM envelope detection over raw unsigned 8-bit I/Q.
//!
//! Everything here is a pure function of its input: no filter history is
//! carried between buffers.

use num_complex::Complex;

use crate::routing::ChannelRouting;

/// Zero level of the unsigned 8-bit I/Q encoding, also its full-scale swing.
pub const IQ_OFFSET: f64 = 127.5;

/// Largest value written to the audio output.
pub const MAX_LEVEL: f64 = 1.0;

/// Map one raw byte to an amplitude in `[-1, 1]`.
#[inline]
pub fn sample_to_amplitude(value: u8) -> f64 {
    (f64::from(value) - IQ_OFFSET) / IQ_OFFSET
}

/// Average a run of interleaved I/Q bytes into a single complex sample.
///
/// `group` holds `ratio` I/Q pairs; a trailing odd byte is ignored.
#[inline]
pub fn boxcar_average(group: &[u8]) -> Complex<f64> {
    let pairs = group.len() / 2;
    if pairs == 0 {
        return Complex::new(0.0, 0.0);
    }
    let mut sum = Complex::new(0.0, 0.0);
    for pair in group.chunks_exact(2) {
        sum.re += sample_to_amplitude(pair[0]);
        sum.im += sample_to_amplitude(pair[1]);
    }
    sum / pairs as f64
}

/// AM envelope detector, limited to `MAX_LEVEL`.
#[inline]
pub fn envelope(sample: Complex<f64>) -> f64 {
    (sample.re * sample.re + sample.im * sample.im)
        .sqrt()
        .min(MAX_LEVEL)
}

/// Decimate `raw` by `ratio`, demodulate, and write the envelope into the
/// interleaved `out` buffer according to `routing`.
///
/// Returns the peak envelope of this buffer. Frames beyond the shorter of the
/// two buffers are left untouched; callers are expected to pass matching
/// lengths.
pub fn demodulate_into(
    raw: &[u8],
    ratio: usize,
    routing: ChannelRouting,
    out: &mut [f32],
    channels: usize,
) -> f32 {
    let ratio = ratio.max(1);
    let channels = channels.max(1);
    let mut peak = 0.0_f32;

    for (group, frame) in raw
        .chunks_exact(ratio * 2)
        .zip(out.chunks_exact_mut(channels))
    {
        let level = envelope(boxcar_average(group)) as f32;
        if level > peak {
            peak = level;
        }
        routing.write_frame(frame, level);
    }

    peak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(a: f64, b: f64, tol: f64, label: &str) {
        assert!(
            (a - b).abs() <= tol,
            "{}: expected {} ≈ {} (tol {})",
            label,
            a,
            b,
            tol
        );
    }

    #[test]
    fn amplitude_mapping_endpoints() {
        assert_approx_eq(sample_to_amplitude(0), -1.0, 1e-12, "0x00");
        assert_approx_eq(sample_to_amplitude(255), 1.0, 1e-12, "0xFF");
        assert_approx_eq(sample_to_amplitude(127), -0.5 / 127.5, 1e-12, "127");
        assert_approx_eq(sample_to_amplitude(128), 0.5 / 127.5, 1e-12, "128");
    }

    #[test]
    fn average_of_constant_sequence() {
        // Five copies of the same I/Q pair average to exactly that pair.
        let group: Vec<u8> = [200u8, 40].repeat(5);
        let avg = boxcar_average(&group);
        assert_approx_eq(avg.re, sample_to_amplitude(200), 1e-12, "I");
        assert_approx_eq(avg.im, sample_to_amplitude(40), 1e-12, "Q");
    }

    #[test]
    fn boxcar_averages_distinct_samples() {
        let group = [255u8, 0, 0, 255];
        let avg = boxcar_average(&group);
        assert_approx_eq(avg.re, 0.0, 1e-12, "I");
        assert_approx_eq(avg.im, 0.0, 1e-12, "Q");
    }

    #[test]
    fn envelope_is_clamped() {
        assert_approx_eq(envelope(Complex::new(1.0, 1.0)), 1.0, 0.0, "full scale");
        assert_approx_eq(envelope(Complex::new(0.6, 0.8)), 1.0, 1e-12, "unit");
        assert_approx_eq(envelope(Complex::new(0.3, 0.4)), 0.5, 1e-12, "half");
    }

    #[test]
    fn near_zero_input_gives_silence() {
        let raw: Vec<u8> = [127u8, 128].repeat(50);
        let mut out = vec![9.0_f32; 20];
        let peak = demodulate_into(&raw, 5, ChannelRouting::Both, &mut out, 2);
        for (idx, &v) in out.iter().enumerate() {
            assert!(v.abs() < 0.01, "frame slot {idx}: {v}");
        }
        assert!(peak < 0.01);
    }

    #[test]
    fn full_scale_input_gives_maximum() {
        for byte in [0x00u8, 0xFF] {
            let raw = vec![byte; 100];
            let mut out = vec![0.0_f32; 20];
            let peak = demodulate_into(&raw, 5, ChannelRouting::Both, &mut out, 2);
            assert!(out.iter().all(|&v| v == 1.0), "byte {byte:#04x}: {out:?}");
            assert_eq!(peak, 1.0);
        }
    }

    #[test]
    fn levels_stay_in_unit_range() {
        // Deterministic pseudo-random bytes.
        let mut state = 0x1234_5678_u32;
        let raw: Vec<u8> = (0..4000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();
        let mut out = vec![0.0_f32; 800];
        demodulate_into(&raw, 5, ChannelRouting::Both, &mut out, 2);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn peak_tracks_single_loud_frame() {
        let mut raw: Vec<u8> = [127u8, 128].repeat(50);
        // Frame 3 (bytes 30..40) at full scale.
        raw[30..40].fill(0xFF);
        let mut out = vec![0.0_f32; 20];
        let peak = demodulate_into(&raw, 5, ChannelRouting::Both, &mut out, 2);
        assert_eq!(peak, 1.0);
        assert_eq!(out[6], 1.0);
        assert!(out[0] < 0.01);
    }

    #[test]
    fn mono_output_layout() {
        let raw = vec![0xFFu8; 40];
        let mut out = vec![0.0_f32; 4];
        demodulate_into(&raw, 5, ChannelRouting::Both, &mut out, 1);
        assert_eq!(out, vec![1.0; 4]);
    }

    #[test]
    fn ratio_of_one_is_passthrough() {
        let raw = [255u8, 127, 127, 127];
        let mut out = vec![0.0_f32; 2];
        demodulate_into(&raw, 1, ChannelRouting::Both, &mut out, 1);
        assert_approx_eq(f64::from(out[0]), 1.0, 1e-4, "frame 0");
        assert!(out[1] < 0.01);
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use num_complex::Complex;

use sdr_audio_core::CancelFlag;

/// Packs driver reads of arbitrary size into fixed-length interleaved
/// I/Q byte buffers.
pub struct BufferAssembler {
    raw: Vec<u8>,
    buf_len: usize,
}

impl BufferAssembler {
    /// `buf_len` is in bytes and must be even.
    pub fn new(buf_len: usize) -> Self {
        debug_assert!(buf_len % 2 == 0, "I/Q buffer length must be even");
        Self {
            raw: Vec::with_capacity(buf_len),
            buf_len,
        }
    }

    /// Append `samples`, calling `on_buffer` for every buffer completed.
    ///
    /// Stops early and returns `false` once `cancel` is set after a delivery;
    /// the rest of `samples` is discarded.
    pub fn push(
        &mut self,
        samples: &[Complex<u8>],
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> bool {
        let mut pending = samples;
        while !pending.is_empty() {
            let take = ((self.buf_len - self.raw.len()) / 2).min(pending.len());
            for sample in &pending[..take] {
                self.raw.push(sample.re);
                self.raw.push(sample.im);
            }
            pending = &pending[take..];

            if self.raw.len() == self.buf_len {
                on_buffer(&self.raw);
                self.raw.clear();
                if cancel.is_set() {
                    return false;
                }
            }
        }
        true
    }

    /// Bytes waiting for the next buffer to fill.
    pub fn pending(&self) -> usize {
        self.raw.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Complex<u8>> {
        (0..n)
            .map(|i| Complex::new((2 * i) as u8, (2 * i + 1) as u8))
            .collect()
    }

    #[test]
    fn interleaves_and_splits_across_reads() {
        let mut asm = BufferAssembler::new(6);
        let mut out: Vec<Vec<u8>> = Vec::new();
        let cancel = CancelFlag::new();
        let all = samples(7);

        assert!(asm.push(&all[..2], &cancel, &mut |b: &[u8]| out.push(b.to_vec())));
        assert!(out.is_empty());
        assert_eq!(asm.pending(), 4);

        assert!(asm.push(&all[2..7], &cancel, &mut |b: &[u8]| out.push(b.to_vec())));
        assert_eq!(out, vec![vec![0, 1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10, 11]]);
        assert_eq!(asm.pending(), 2);
    }

    #[test]
    fn cancel_discards_rest_of_read() {
        let mut asm = BufferAssembler::new(4);
        let cancel = CancelFlag::new();
        let mut count = 0;
        let keep_going = asm.push(&samples(10), &cancel, &mut |_b: &[u8]| {
            count += 1;
            cancel.set();
        });
        assert!(!keep_going);
        assert_eq!(count, 1);
    }
}

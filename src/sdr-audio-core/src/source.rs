// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::error::SourceError;
use crate::shutdown::CancelFlag;

/// Producer of raw interleaved unsigned 8-bit I/Q buffers.
///
/// Opening and configuring the device happens when the source is
/// constructed; a source value is ready to stream.
pub trait SampleSource {
    /// Deliver `buf_len`-byte buffers to `on_buffer` until `cancel` is set,
    /// the input ends, or the driver fails.
    ///
    /// Contract for implementations:
    /// - every buffer passed to `on_buffer` is exactly `buf_len` bytes;
    /// - `on_buffer` is never re-entered; one call completes before the next
    ///   buffer is delivered;
    /// - `cancel` is checked at least once per delivered buffer, so at most
    ///   one buffer is delivered after it is set.
    ///
    /// Returns `Ok(())` when stopped by `cancel` or at end of input.
    fn read_async(
        &mut self,
        buf_len: usize,
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> Result<(), SourceError>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read_async(
        &mut self,
        buf_len: usize,
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> Result<(), SourceError> {
        (**self).read_async(buf_len, cancel, on_buffer)
    }
}

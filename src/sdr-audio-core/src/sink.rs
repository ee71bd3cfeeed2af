// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::error::SinkError;

/// Blocking consumer of interleaved `f32` audio frames.
pub trait AudioSink {
    /// Interleaved channel count the sink was opened with.
    fn channels(&self) -> usize;

    /// Queue `samples` (a whole number of frames) for playback, blocking
    /// until they are accepted. Returns the number of frames accepted.
    fn write_interleaved(&mut self, samples: &[f32]) -> Result<usize, SinkError>;

    /// Block until everything queued has been played.
    fn drain(&mut self) -> Result<(), SinkError>;
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn write_interleaved(&mut self, samples: &[f32]) -> Result<usize, SinkError> {
        (**self).write_interleaved(samples)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        (**self).drain()
    }
}

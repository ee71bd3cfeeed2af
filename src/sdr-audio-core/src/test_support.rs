// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Test doubles shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use crate::error::{SinkError, SourceError};
use crate::meter::LevelMeter;
use crate::shutdown::{CancelFlag, Shutdown};
use crate::sink::AudioSink;
use crate::source::SampleSource;

#[derive(Debug, Default)]
pub struct SinkLog {
    pub writes: Vec<Vec<f32>>,
    pub drained: bool,
}

/// Sink that records every write.
pub struct RecordingSink {
    channels: usize,
    pub log: Arc<Mutex<SinkLog>>,
}

impl RecordingSink {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            log: Arc::new(Mutex::new(SinkLog::default())),
        }
    }

    pub fn writes(&self) -> Vec<Vec<f32>> {
        self.log.lock().unwrap().writes.clone()
    }
}

impl AudioSink for RecordingSink {
    fn channels(&self) -> usize {
        self.channels
    }

    fn write_interleaved(&mut self, samples: &[f32]) -> Result<usize, SinkError> {
        self.log.lock().unwrap().writes.push(samples.to_vec());
        Ok(samples.len() / self.channels)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        self.log.lock().unwrap().drained = true;
        Ok(())
    }
}

/// Sink whose writes always fail.
pub struct FailingSink {
    channels: usize,
    pub drained: Arc<Mutex<bool>>,
}

impl FailingSink {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            drained: Arc::new(Mutex::new(false)),
        }
    }
}

impl AudioSink for FailingSink {
    fn channels(&self) -> usize {
        self.channels
    }

    fn write_interleaved(&mut self, _samples: &[f32]) -> Result<usize, SinkError> {
        Err(SinkError::Stream("device unplugged".to_string()))
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        *self.drained.lock().unwrap() = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMeter {
    pub peaks: Arc<Mutex<Vec<f32>>>,
}

impl LevelMeter for RecordingMeter {
    fn report(&mut self, peak: f32) {
        self.peaks.lock().unwrap().push(peak);
    }
}

/// What a `ScriptedSource` does once its buffers run out.
pub enum ScriptEnd {
    EndOfInput,
    DriverError(i32),
    /// Keep delivering the last buffer until cancelled.
    RepeatUntilCancelled,
}

/// Source that delivers a fixed list of buffers.
pub struct ScriptedSource {
    pub buffers: Vec<Vec<u8>>,
    pub end: ScriptEnd,
    /// Request shutdown on this handle after delivering buffer `n`.
    pub shutdown_after: Option<(usize, Shutdown)>,
    pub delivered: Arc<Mutex<usize>>,
}

impl ScriptedSource {
    pub fn new(buffers: Vec<Vec<u8>>, end: ScriptEnd) -> Self {
        Self {
            buffers,
            end,
            shutdown_after: None,
            delivered: Arc::new(Mutex::new(0)),
        }
    }

    fn deliver(&mut self, buf: &[u8], on_buffer: &mut dyn FnMut(&[u8])) {
        on_buffer(buf);
        let mut delivered = self.delivered.lock().unwrap();
        *delivered += 1;
        if let Some((n, ref shutdown)) = self.shutdown_after {
            if *delivered == n {
                shutdown.request_shutdown();
            }
        }
    }
}

impl SampleSource for ScriptedSource {
    fn read_async(
        &mut self,
        _buf_len: usize,
        cancel: &CancelFlag,
        on_buffer: &mut dyn FnMut(&[u8]),
    ) -> Result<(), SourceError> {
        let buffers = std::mem::take(&mut self.buffers);
        for buf in &buffers {
            if cancel.is_set() {
                break;
            }
            self.deliver(buf, on_buffer);
        }
        match self.end {
            ScriptEnd::EndOfInput => Ok(()),
            ScriptEnd::DriverError(code) => Err(SourceError::driver(code, "transfer failed")),
            ScriptEnd::RepeatUntilCancelled => {
                let last = buffers.last().cloned().unwrap_or_default();
                while !cancel.is_set() {
                    self.deliver(&last, on_buffer);
                }
                Ok(())
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-buffer decimation, demodulation and audio write.

use tracing::{debug, warn};

use crate::decim;
use crate::error::{ParamsError, SinkError};
use crate::meter::LevelMeter;
use crate::routing::ChannelRouting;
use crate::shutdown::Shutdown;
use crate::sink::AudioSink;

/// Fixed geometry of the pipeline, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineParams {
    /// Raw I/Q pairs averaged into one output frame.
    pub decimation_ratio: usize,
    /// Audio frames produced per raw buffer.
    pub output_frames: usize,
    /// Interleaved output channels (1 or 2).
    pub channels: usize,
    pub routing: ChannelRouting,
}

impl PipelineParams {
    /// Derive the decimation ratio from the capture and playback rates.
    pub fn from_rates(
        sdr_sample_rate: u32,
        audio_sample_rate: u32,
        output_frames: usize,
        channels: usize,
        routing: ChannelRouting,
    ) -> Result<Self, ParamsError> {
        if audio_sample_rate == 0 || sdr_sample_rate < audio_sample_rate {
            return Err(ParamsError::ZeroRatio);
        }
        if sdr_sample_rate % audio_sample_rate != 0 {
            return Err(ParamsError::RateNotMultiple {
                sdr: sdr_sample_rate,
                audio: audio_sample_rate,
            });
        }
        let params = Self {
            decimation_ratio: (sdr_sample_rate / audio_sample_rate) as usize,
            output_frames,
            channels,
            routing,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.decimation_ratio == 0 {
            return Err(ParamsError::ZeroRatio);
        }
        if self.output_frames == 0 {
            return Err(ParamsError::ZeroFrames);
        }
        if !(1..=2).contains(&self.channels) {
            return Err(ParamsError::Channels(self.channels));
        }
        if !self.routing.fits(self.channels) {
            return Err(ParamsError::RoutingNeedsStereo(self.routing));
        }
        Ok(())
    }

    /// Bytes per raw I/Q buffer: `output_frames * decimation_ratio * 2`.
    pub fn raw_buffer_len(&self) -> usize {
        self.output_frames * self.decimation_ratio * 2
    }

    /// Samples in the interleaved output buffer.
    pub fn output_len(&self) -> usize {
        self.output_frames * self.channels
    }
}

/// Result of one `Engine::process` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessOutcome {
    /// Buffer demodulated and handed to the sink.
    Written { frames: usize, peak: f32 },
    /// Shutdown was requested; nothing was touched.
    Cancelled,
    /// The source delivered a buffer of the wrong size; it was dropped.
    Rejected { expected: usize, actual: usize },
}

/// Decimation and demodulation engine.
///
/// Owns the output buffer and the sink. The buffer is allocated once and
/// rewritten in full on every accepted call.
pub struct Engine<S> {
    params: PipelineParams,
    output: Box<[f32]>,
    sink: S,
    meter: Box<dyn LevelMeter>,
    shutdown: Shutdown,
    buffers: u64,
    rejected: u64,
}

impl<S: AudioSink> Engine<S> {
    pub fn new(
        params: PipelineParams,
        sink: S,
        meter: Box<dyn LevelMeter>,
        shutdown: Shutdown,
    ) -> Result<Self, ParamsError> {
        params.validate()?;
        if sink.channels() != params.channels {
            return Err(ParamsError::ChannelMismatch {
                sink: sink.channels(),
                expected: params.channels,
            });
        }
        Ok(Self {
            params,
            output: vec![0.0; params.output_len()].into_boxed_slice(),
            sink,
            meter,
            shutdown,
            buffers: 0,
            rejected: 0,
        })
    }

    /// Process one raw buffer.
    ///
    /// A no-op once shutdown is requested. Sink failures are returned to the
    /// caller unchanged.
    pub fn process(&mut self, raw: &[u8]) -> Result<ProcessOutcome, SinkError> {
        if self.shutdown.is_cancelled() {
            return Ok(ProcessOutcome::Cancelled);
        }

        let expected = self.params.raw_buffer_len();
        if raw.len() != expected {
            self.rejected += 1;
            warn!(
                "dropping I/Q buffer of {} bytes (expected {})",
                raw.len(),
                expected
            );
            return Ok(ProcessOutcome::Rejected {
                expected,
                actual: raw.len(),
            });
        }

        let peak = decim::demodulate_into(
            raw,
            self.params.decimation_ratio,
            self.params.routing,
            &mut self.output,
            self.params.channels,
        );
        self.meter.report(peak);

        let frames = self.sink.write_interleaved(&self.output)?;
        if frames < self.params.output_frames {
            debug!(
                "audio sink accepted {} of {} frames",
                frames, self.params.output_frames
            );
        }
        self.buffers += 1;
        Ok(ProcessOutcome::Written { frames, peak })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Most recently written output buffer.
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn buffers_processed(&self) -> u64 {
        self.buffers
    }

    pub fn buffers_rejected(&self) -> u64 {
        self.rejected
    }

    /// Clear the level meter line.
    pub fn finish_meter(&mut self) {
        self.meter.finish();
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

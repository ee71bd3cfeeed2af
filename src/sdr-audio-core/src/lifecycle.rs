// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Start, cancellation, drain and shutdown of the capture pipeline.
//!
//! ```text
//! Running ──request_shutdown()──▶ CancelRequested ──source returns──▶ Draining ──▶ Terminated
//!    └────────────── source returns on its own ─────────────────────────▲
//! ```

use std::fmt;

use tracing::{error, info, warn};

use crate::engine::{Engine, PipelineParams};
use crate::error::{ParamsError, SinkError, SourceError};
use crate::meter::LevelMeter;
use crate::shutdown::Shutdown;
use crate::sink::AudioSink;
use crate::source::SampleSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Running = 0,
    CancelRequested = 1,
    Draining = 2,
    Terminated = 3,
}

impl LifecycleState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Running,
            1 => LifecycleState::CancelRequested,
            2 => LifecycleState::Draining,
            _ => LifecycleState::Terminated,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Running => "running",
            LifecycleState::CancelRequested => "cancel requested",
            LifecycleState::Draining => "draining",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(s)
    }
}

/// Why the pipeline stopped.
#[derive(Debug)]
pub enum ExitReason {
    /// Shutdown was requested by the user.
    UserCancel,
    /// The source ran out of input (file replay).
    EndOfStream,
    /// The source's delivery loop failed on its own.
    Source(SourceError),
    /// Writing to the audio sink failed.
    Sink(SinkError),
}

impl ExitReason {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitReason::UserCancel | ExitReason::EndOfStream)
    }

    /// Process exit status: 0 on success, the driver's code magnitude for
    /// source failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::UserCancel | ExitReason::EndOfStream => 0,
            ExitReason::Source(e) => e.exit_code(),
            ExitReason::Sink(_) => 1,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::UserCancel => f.write_str("user cancel"),
            ExitReason::EndOfStream => f.write_str("end of input"),
            ExitReason::Source(e) => write!(f, "library error: {}", e),
            ExitReason::Sink(e) => write!(f, "audio sink error: {}", e),
        }
    }
}

/// Drives one source into one engine until shutdown, then drains the sink.
pub struct Controller<Src, Snk> {
    source: Src,
    engine: Engine<Snk>,
    shutdown: Shutdown,
}

impl<Src: SampleSource, Snk: AudioSink> Controller<Src, Snk> {
    /// Build the engine around `sink` and pair it with `source`.
    ///
    /// `shutdown` is the shared context; keep a clone of it to stop the
    /// pipeline from another thread.
    pub fn new(
        source: Src,
        sink: Snk,
        params: PipelineParams,
        meter: Box<dyn LevelMeter>,
        shutdown: Shutdown,
    ) -> Result<Self, ParamsError> {
        let engine = Engine::new(params, sink, meter, shutdown.clone())?;
        Ok(Self {
            source,
            engine,
            shutdown,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.shutdown.state()
    }

    /// Stream until cancelled or failed, then drain and release everything.
    ///
    /// Blocks the calling thread for the lifetime of the stream.
    pub fn run(self) -> ExitReason {
        let Self {
            mut source,
            mut engine,
            shutdown,
        } = self;

        let buf_len = engine.params().raw_buffer_len();
        info!(
            "Reading samples: {} byte buffers, decimation {}, {} frames x {} ch, routing {}",
            buf_len,
            engine.params().decimation_ratio,
            engine.params().output_frames,
            engine.params().channels,
            engine.params().routing,
        );

        let mut sink_error: Option<SinkError> = None;
        let result = source.read_async(buf_len, shutdown.flag(), &mut |raw: &[u8]| {
            if let Err(e) = engine.process(raw) {
                error!("audio write failed: {}", e);
                if sink_error.is_none() {
                    sink_error = Some(e);
                }
                shutdown.abort();
            }
        });

        engine.finish_meter();

        let reason = if let Some(e) = sink_error {
            if let Err(src) = result {
                warn!("sample source also stopped with: {}", src);
            }
            ExitReason::Sink(e)
        } else if shutdown.is_requested() {
            if let Err(src) = result {
                warn!("sample source stopped with {} after cancel", src);
            }
            ExitReason::UserCancel
        } else {
            match result {
                Ok(()) => ExitReason::EndOfStream,
                Err(e) => ExitReason::Source(e),
            }
        };

        // The source is done delivering; make sure nothing else gets in.
        shutdown.abort();
        shutdown.set_state(LifecycleState::Draining);
        info!(
            "Stopping ({}), {} buffers processed, {} rejected; draining audio",
            reason,
            engine.buffers_processed(),
            engine.buffers_rejected()
        );

        drop(source);
        let mut sink = engine.into_sink();
        if !matches!(reason, ExitReason::Sink(_)) {
            if let Err(e) = sink.drain() {
                warn!("audio drain failed: {}", e);
            }
        }
        drop(sink);

        shutdown.set_state(LifecycleState::Terminated);
        reason
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Blocking audio output on top of a cpal stream.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info, warn};

use sdr_audio_core::{AudioSink, SinkError};

use crate::config::AudioConfig;

const AUDIO_STREAM_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(10);
/// Longest a write may wait for the device to take samples.
const WRITE_STALL_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_GRACE: Duration = Duration::from_secs(1);

struct StreamErrorLogger {
    label: &'static str,
    state: Mutex<StreamErrorState>,
}

#[derive(Default)]
struct StreamErrorState {
    last_error: Option<String>,
    last_logged_at: Option<Instant>,
    suppressed: u64,
}

impl StreamErrorLogger {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            state: Mutex::new(StreamErrorState::default()),
        }
    }

    fn log(&self, err: &str) {
        let now = Instant::now();
        let Ok(mut state) = self.state.lock() else {
            error!("{}: {}", self.label, err);
            return;
        };
        let should_log_now = match (&state.last_error, state.last_logged_at) {
            (Some(prev), Some(ts)) => {
                prev != err || now.duration_since(ts) >= AUDIO_STREAM_ERROR_LOG_INTERVAL
            }
            _ => true,
        };

        if should_log_now {
            if state.suppressed > 0 {
                warn!(
                    "{} repeated {} times: {}",
                    self.label,
                    state.suppressed,
                    state.last_error.as_deref().unwrap_or("<unknown>")
                );
            }
            error!("{}: {}", self.label, err);
            state.last_error = Some(err.to_string());
            state.last_logged_at = Some(now);
            state.suppressed = 0;
        } else {
            state.suppressed += 1;
        }
    }
}

/// Bounded sample queue shared between the writer and the output callback.
#[derive(Debug)]
struct PlaybackQueue {
    samples: VecDeque<f32>,
    capacity: usize,
    underruns: u64,
    failed: Option<String>,
}

impl PlaybackQueue {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            underruns: 0,
            failed: None,
        }
    }

    fn space(&self) -> usize {
        self.capacity.saturating_sub(self.samples.len())
    }

    /// Queue as much of `samples` as fits, returning how many were taken.
    fn push(&mut self, samples: &[f32]) -> usize {
        let n = samples.len().min(self.space());
        self.samples.extend(&samples[..n]);
        n
    }

    /// Fill a device buffer, padding with silence. Counts an underrun when
    /// the queue ran dry mid-buffer.
    fn fill(&mut self, out: &mut [f32]) {
        let mut starved = false;
        for sample in out.iter_mut() {
            match self.samples.pop_front() {
                Some(s) => *sample = s,
                None => {
                    *sample = 0.0;
                    starved = true;
                }
            }
        }
        if starved {
            self.underruns += 1;
        }
    }
}

struct Shared {
    queue: Mutex<PlaybackQueue>,
    changed: Condvar,
}

impl Shared {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(PlaybackQueue::new(capacity)),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PlaybackQueue>, SinkError> {
        self.queue.lock().map_err(|_| poisoned())
    }

    /// Output callback side: hand queued samples to the device.
    fn fill(&self, out: &mut [f32]) {
        match self.queue.lock() {
            Ok(mut queue) => queue.fill(out),
            Err(_) => out.fill(0.0),
        }
        self.changed.notify_all();
    }

    /// Mark the output as lost and wake any waiting writer.
    fn fail(&self, reason: String) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.failed = Some(reason);
        }
        self.changed.notify_all();
    }

    /// Queue all of `samples`, blocking while the queue is full.
    ///
    /// `after_chunk` runs with the current underrun count each time some
    /// samples were queued, outside the lock. Fails with `Stalled` when no
    /// space frees up within `timeout`.
    fn write_all(
        &self,
        samples: &[f32],
        timeout: Duration,
        mut after_chunk: impl FnMut(u64) -> Result<(), SinkError>,
    ) -> Result<(), SinkError> {
        let mut rest = samples;
        while !rest.is_empty() {
            let underruns = {
                let deadline = Instant::now() + timeout;
                let mut queue = self.lock()?;
                while queue.failed.is_none() && queue.space() == 0 {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(SinkError::Stalled);
                    }
                    let (guard, _) = self
                        .changed
                        .wait_timeout(queue, deadline - now)
                        .map_err(|_| poisoned())?;
                    queue = guard;
                }
                if let Some(reason) = &queue.failed {
                    return Err(SinkError::Stream(reason.clone()));
                }
                let taken = queue.push(rest);
                rest = &rest[taken..];
                queue.underruns
            };
            after_chunk(underruns)?;
        }
        Ok(())
    }

    /// Wait until the device has taken every queued sample. Returns `false`
    /// when `timeout` passed first.
    fn wait_empty(&self, timeout: Duration) -> Result<bool, SinkError> {
        let deadline = Instant::now() + timeout;
        let mut queue = self.lock()?;
        loop {
            if let Some(reason) = &queue.failed {
                return Err(SinkError::Stream(reason.clone()));
            }
            if queue.samples.is_empty() {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "Audio playback: drain timed out with {} samples queued",
                    queue.samples.len()
                );
                return Ok(false);
            }
            let (guard, _) = self
                .changed
                .wait_timeout(queue, deadline - now)
                .map_err(|_| poisoned())?;
            queue = guard;
        }
    }
}

fn poisoned() -> SinkError {
    SinkError::Stream("audio queue poisoned".into())
}

/// Audio sink writing interleaved `f32` frames to a cpal output device.
///
/// Writes block while the playback queue is full, so the caller is paced by
/// the sound card.
pub struct CpalSink {
    stream: cpal::Stream,
    shared: Arc<Shared>,
    channels: usize,
    playing: bool,
    drain_timeout: Duration,
    reported_underruns: u64,
}

impl CpalSink {
    pub fn open(cfg: &AudioConfig) -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = if cfg.device.is_empty() || cfg.device == "default" {
            host.default_output_device()
                .ok_or_else(|| SinkError::DeviceNotFound("default".into()))?
        } else {
            host.output_devices()
                .map_err(|e| SinkError::Stream(e.to_string()))?
                .find(|d| d.name().map(|n| n == cfg.device).unwrap_or(false))
                .ok_or_else(|| SinkError::DeviceNotFound(cfg.device.clone()))?
        };

        info!(
            "Audio playback: using device '{}'",
            device.name().unwrap_or_else(|_| "unknown".into())
        );
        check_supported(&device, cfg)?;

        let config = cpal::StreamConfig {
            channels: cfg.channels,
            sample_rate: cpal::SampleRate(cfg.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let capacity = queue_capacity(cfg.sample_rate, cfg.channels, cfg.latency_ms);
        let shared = Arc::new(Shared::new(capacity));

        let output_err_logger = Arc::new(StreamErrorLogger::new("Audio output stream error"));
        let stream = device
            .build_output_stream(
                &config,
                {
                    let shared = shared.clone();
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| shared.fill(data)
                },
                {
                    let shared = shared.clone();
                    move |err| {
                        output_err_logger.log(&err.to_string());
                        if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                            shared.fail(err.to_string());
                        }
                    }
                },
                None,
            )
            .map_err(|e| SinkError::Unsupported(e.to_string()))?;

        info!(
            "Audio playback: ready ({}Hz, {} ch, {} ms queue)",
            cfg.sample_rate, cfg.channels, cfg.latency_ms
        );

        Ok(Self {
            stream,
            shared,
            channels: cfg.channels as usize,
            playing: false,
            drain_timeout: Duration::from_millis(u64::from(cfg.latency_ms)) + DRAIN_GRACE,
            reported_underruns: 0,
        })
    }

    fn start(&mut self) -> Result<(), SinkError> {
        if !self.playing {
            self.stream
                .play()
                .map_err(|e| SinkError::Stream(e.to_string()))?;
            self.playing = true;
            info!("Audio playback: started");
        }
        Ok(())
    }

    fn report_underruns(&mut self, underruns: u64) {
        if underruns > self.reported_underruns {
            warn!(
                "Audio playback: {} underrun(s), total {}",
                underruns - self.reported_underruns,
                underruns
            );
            self.reported_underruns = underruns;
        }
    }
}

impl AudioSink for CpalSink {
    fn channels(&self) -> usize {
        self.channels
    }

    fn write_interleaved(&mut self, samples: &[f32]) -> Result<usize, SinkError> {
        if samples.len() % self.channels != 0 {
            return Err(SinkError::Misaligned(samples.len()));
        }

        let shared = self.shared.clone();
        shared.write_all(samples, WRITE_STALL_TIMEOUT, |underruns| {
            self.report_underruns(underruns);
            self.start()
        })?;

        Ok(samples.len() / self.channels)
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        if !self.playing {
            return Ok(());
        }
        self.shared.wait_empty(self.drain_timeout)?;
        if let Err(e) = self.stream.pause() {
            debug!("Audio playback: pause failed: {}", e);
        }
        self.playing = false;
        debug!("Audio playback: drained");
        Ok(())
    }
}

/// Samples held in the playback queue for the requested latency.
fn queue_capacity(sample_rate: u32, channels: u16, latency_ms: u32) -> usize {
    let frames = u64::from(sample_rate) * u64::from(latency_ms) / 1000;
    (frames as usize).max(1) * channels as usize
}

fn check_supported(device: &cpal::Device, cfg: &AudioConfig) -> Result<(), SinkError> {
    let ranges = match device.supported_output_configs() {
        Ok(ranges) => ranges,
        Err(e) => {
            // Some backends cannot enumerate; let stream creation decide.
            debug!("Audio playback: cannot list output configs: {}", e);
            return Ok(());
        }
    };
    let rate = cpal::SampleRate(cfg.sample_rate);
    let found = ranges.into_iter().any(|r| {
        r.sample_format() == cpal::SampleFormat::F32
            && r.channels() == cfg.channels
            && r.min_sample_rate() <= rate
            && rate <= r.max_sample_rate()
    });
    if found {
        Ok(())
    } else {
        Err(SinkError::Unsupported(format!(
            "f32, {} ch, {} Hz",
            cfg.channels, cfg.sample_rate
        )))
    }
}

// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod decim;
pub mod engine;
pub mod error;
pub mod freq;
pub mod lifecycle;
pub mod meter;
pub mod routing;
pub mod shutdown;
pub mod sink;
pub mod source;

#[cfg(test)]
mod test_support;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use engine::{Engine, PipelineParams, ProcessOutcome};
pub use error::{ParamsError, SinkError, SourceError};
pub use lifecycle::{Controller, ExitReason, LifecycleState};
pub use meter::{LevelMeter, MeterMode};
pub use routing::ChannelRouting;
pub use shutdown::{CancelFlag, Shutdown};
pub use sink::AudioSink;
pub use source::SampleSource;

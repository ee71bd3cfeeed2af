// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Cooperative cancellation shared between the signal task, the sample
//! source's delivery loop and the engine.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::lifecycle::LifecycleState;

/// One-way stop flag. Once set it stays set.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Set the flag. Returns `true` if this call was the one that set it.
    ///
    /// Relaxed ordering is enough: the engine is only ever invoked from one
    /// thread at a time, so there is nothing else to publish.
    #[inline]
    pub fn set(&self) -> bool {
        !self.0.swap(true, Ordering::Relaxed)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Inner {
    flag: CancelFlag,
    requested: AtomicBool,
    state: AtomicU8,
}

/// Shared pipeline context: the cancellation flag plus the lifecycle state.
///
/// Cloning is cheap; every clone observes the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                flag: CancelFlag::new(),
                requested: AtomicBool::new(false),
                state: AtomicU8::new(LifecycleState::Running as u8),
            }),
        }
    }

    /// Ask the pipeline to stop.
    ///
    /// Safe to call from any thread, any number of times. Performs only
    /// atomic operations: no allocation, locking or I/O. Returns `true` for
    /// the call that moved the lifecycle from `Running` to `CancelRequested`.
    pub fn request_shutdown(&self) -> bool {
        self.inner.requested.store(true, Ordering::Relaxed);
        self.inner.flag.set();
        self.inner
            .state
            .compare_exchange(
                LifecycleState::Running as u8,
                LifecycleState::CancelRequested as u8,
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Whether `request_shutdown` was called, as opposed to the pipeline
    /// stopping itself.
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Relaxed)
    }

    /// Raise the cancellation flag without recording a user request. Used
    /// when the pipeline stops on its own.
    pub(crate) fn abort(&self) {
        self.inner.flag.set();
    }

    pub fn flag(&self) -> &CancelFlag {
        &self.inner.flag
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.is_set()
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.inner.state.load(Ordering::Relaxed))
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        self.inner.state.store(state as u8, Ordering::Relaxed);
    }
}

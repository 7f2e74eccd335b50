// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One scheduled unit of timer work.
//!
//! A task lives in exactly one bucket on exactly one wheel at any moment;
//! the wheel holds it weakly, the owning `Timer` strongly. Stopping a timer
//! clears the callback slot under the task's mutex, so an in-flight firing
//! that already entered the slot completes while a stopped task no-ops.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

type TaskCallback = Box<dyn Fn() + Send>;

/// Bookkeeping for one timer registration.
pub struct TimerTask {
    timer_id: u64,
    interval_ms: u64,
    oneshot: bool,
    /// Residual delay carried across assistant-wheel rotations.
    pub(crate) remainder_interval_ms: AtomicU64,
    /// Planned delay until the next firing, drift-adjusted at each fire.
    pub(crate) next_fire_duration_ms: AtomicU64,
    /// Cumulative scheduling error, actual minus ideal.
    pub(crate) accumulated_error_ns: AtomicI64,
    /// Monotonic timestamp of the last firing.
    pub(crate) last_execute_time_ns: AtomicU64,
    callback: Mutex<Option<TaskCallback>>,
}

impl TimerTask {
    pub(crate) fn new(timer_id: u64, interval_ms: u64, oneshot: bool) -> Self {
        Self {
            timer_id,
            interval_ms,
            oneshot,
            remainder_interval_ms: AtomicU64::new(0),
            next_fire_duration_ms: AtomicU64::new(interval_ms),
            accumulated_error_ns: AtomicI64::new(0),
            last_execute_time_ns: AtomicU64::new(0),
            callback: Mutex::new(None),
        }
    }

    pub fn timer_id(&self) -> u64 {
        self.timer_id
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn oneshot(&self) -> bool {
        self.oneshot
    }

    pub(crate) fn set_callback(&self, callback: TaskCallback) {
        *self.callback.lock() = Some(callback);
    }

    /// Detach the callback; any later firing becomes a no-op.
    pub(crate) fn clear_callback(&self) {
        *self.callback.lock() = None;
    }

    /// Run the callback if the task is still armed.
    ///
    /// `try_lock` keeps concurrent fires of the same task from stacking up:
    /// if a previous firing still holds the slot, this one is skipped.
    pub(crate) fn fire(&self) {
        if let Some(guard) = self.callback.try_lock() {
            if let Some(callback) = guard.as_ref() {
                callback();
            }
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! User-visible timer objects.
//!
//! A `Timer` owns one `TimerTask` registered on the process-wide timing
//! wheel. Its firing callback compensates drift: each fire compares the
//! actual monotonic time against the planned schedule, accumulates the
//! error, and subtracts it (together with the callback's own runtime) from
//! the next planned delay.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{monotonic_now_ns, TimerTask, TimingWheel};
use crate::config::{TIMER_MAX_INTERVAL_MS, TIMER_RESOLUTION_MS};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

fn next_timer_id() -> u64 {
    NEXT_TIMER_ID.fetch_add(1, Ordering::SeqCst)
}

/// What a timer should do and how often.
#[derive(Clone)]
pub struct TimerOption {
    /// Firing period in milliseconds, `1..=65536`.
    pub period_ms: u64,
    /// The work performed at each firing.
    pub callback: Arc<dyn Fn() + Send + Sync>,
    /// True: fire once and disarm. False: fire every period.
    pub oneshot: bool,
}

impl TimerOption {
    pub fn new(period_ms: u64, callback: Arc<dyn Fn() + Send + Sync>, oneshot: bool) -> Self {
        Self {
            period_ms,
            callback,
            oneshot,
        }
    }
}

/// Oneshot or periodic timing task handle.
pub struct Timer {
    timer_id: u64,
    option: TimerOption,
    task: Mutex<Option<Arc<TimerTask>>>,
    started: AtomicBool,
}

impl Timer {
    pub fn new(option: TimerOption) -> Self {
        Self {
            timer_id: next_timer_id(),
            option,
            task: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Convenience constructor mirroring `TimerOption::new`.
    pub fn with_callback<F>(period_ms: u64, callback: F, oneshot: bool) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(TimerOption::new(period_ms, Arc::new(callback), oneshot))
    }

    pub fn timer_id(&self) -> u64 {
        self.timer_id
    }

    /// Arm the timer.
    ///
    /// Rejects an out-of-range period with a warning and returns false.
    /// A second start while armed is a no-op returning true.
    pub fn start(&self) -> bool {
        if self.option.period_ms == 0 || self.option.period_ms > TIMER_MAX_INTERVAL_MS {
            log::warn!(
                "[Timer::start] timer {} period {} ms out of range (1..={} ms)",
                self.timer_id,
                self.option.period_ms,
                TIMER_MAX_INTERVAL_MS
            );
            return false;
        }
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return true;
        }

        let task = self.init_timer_task();
        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&task));
        TimingWheel::instance().add_task(&task);
        log::debug!(
            "[Timer::start] timer {} armed, period {} ms, oneshot {}",
            self.timer_id,
            self.option.period_ms,
            self.option.oneshot
        );
        true
    }

    /// Disarm the timer.
    ///
    /// Clears the task's callback under the task mutex; a firing already in
    /// the slot completes normally and does not re-arm.
    pub fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        let task = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(task) = task {
            task.clear_callback();
        }
        log::debug!("[Timer::stop] timer {} disarmed", self.timer_id);
    }

    /// Build the task whose callback runs the user's work and performs the
    /// drift-compensated re-arm for periodic timers.
    fn init_timer_task(&self) -> Arc<TimerTask> {
        let task = Arc::new(TimerTask::new(
            self.timer_id,
            self.option.period_ms,
            self.option.oneshot,
        ));

        let weak = Arc::downgrade(&task);
        let user_callback = Arc::clone(&self.option.callback);
        let period_ms = self.option.period_ms;
        let oneshot = self.option.oneshot;

        task.set_callback(Box::new(move || {
            let task = match weak.upgrade() {
                Some(task) => task,
                None => return,
            };

            let start_ns = monotonic_now_ns();
            let last_ns = task.last_execute_time_ns.load(Ordering::SeqCst);
            if last_ns != 0 {
                // Planned delay for the wait that just elapsed.
                let ideal_ns =
                    (task.next_fire_duration_ms.load(Ordering::SeqCst) * 1_000_000) as i64;
                let actual_ns = start_ns as i64 - last_ns as i64;
                task.accumulated_error_ns
                    .fetch_add(actual_ns - ideal_ns, Ordering::SeqCst);
            }
            task.last_execute_time_ns.store(start_ns, Ordering::SeqCst);

            user_callback();

            if oneshot {
                return;
            }

            // Subtract the callback's runtime and the accumulated error from
            // the next delay, clamped to one wheel resolution.
            let execute_ms = (monotonic_now_ns() - start_ns) / 1_000_000;
            let next_ms = if execute_ms >= period_ms {
                TIMER_RESOLUTION_MS
            } else {
                let budget_ms = (period_ms - execute_ms) as i64;
                let error_ms = task.accumulated_error_ns.load(Ordering::SeqCst) / 1_000_000;
                if budget_ms > error_ms {
                    (budget_ms - error_ms) as u64
                } else {
                    TIMER_RESOLUTION_MS
                }
            };
            task.next_fire_duration_ms.store(next_ms, Ordering::SeqCst);
            TimingWheel::instance().add_task(&task);
        }));

        task
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

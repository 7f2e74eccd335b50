// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Two-level timing wheel driving periodic and one-shot tasks.
//!
//! The work wheel covers delays up to `512 x 2 = 1024 ms` directly; longer
//! delays park on the assistant wheel and cascade back into the work wheel
//! one rotation at a time, carrying their residual delay in
//! `remainder_interval_ms`. A dedicated thread advances the wheel every
//! 2 ms, paced by a monotonic deadline accumulator so callback runtime never
//! skews the tick rate.
//!
//! Expired tasks are handed to the scheduler; user callbacks never run on
//! the tick thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use super::{TimerBucket, TimerTask};
use crate::config::{
    ASSISTANT_WHEEL_SIZE, TIMER_RESOLUTION_MS, WORK_WHEEL_SIZE,
};
use crate::scheduler::Scheduler;

/// Process-wide two-level timing wheel.
pub struct TimingWheel {
    work_wheel: Vec<TimerBucket>,
    assistant_wheel: Vec<TimerBucket>,
    current_work_index: AtomicU64,
    current_assistant_index: AtomicU64,
    running: AtomicBool,
    /// Serializes start/shutdown transitions.
    running_mutex: Mutex<()>,
    tick_count: AtomicU64,
    tick_thread: Mutex<Option<thread::JoinHandle<()>>>,
}

static INSTANCE: Mutex<Option<Arc<TimingWheel>>> = Mutex::new(None);

impl TimingWheel {
    /// Get the process-wide instance, creating it on first use. The tick
    /// thread starts lazily with the first registered task.
    pub fn instance() -> Arc<Self> {
        let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert_with(|| Arc::new(Self::new())).clone()
    }

    /// Stop and drop the process-wide instance.
    pub fn reset() {
        let taken = {
            let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(wheel) = taken {
            wheel.shutdown();
        }
    }

    fn new() -> Self {
        Self {
            work_wheel: (0..WORK_WHEEL_SIZE).map(|_| TimerBucket::default()).collect(),
            assistant_wheel: (0..ASSISTANT_WHEEL_SIZE)
                .map(|_| TimerBucket::default())
                .collect(),
            current_work_index: AtomicU64::new(0),
            current_assistant_index: AtomicU64::new(0),
            running: AtomicBool::new(false),
            running_mutex: Mutex::new(()),
            tick_count: AtomicU64::new(0),
            tick_thread: Mutex::new(None),
        }
    }

    /// Launch the tick thread. Idempotent.
    pub fn start(self: Arc<Self>) {
        let _guard = self.running_mutex.lock().unwrap_or_else(|e| e.into_inner());
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let wheel = Arc::clone(&self);
        #[allow(clippy::expect_used)] // thread spawn failure is unrecoverable
        let handle = thread::Builder::new()
            .name("axon-timing-wheel".to_string())
            .spawn(move || wheel.tick_loop())
            .expect("Failed to spawn timing wheel thread");
        *self.tick_thread.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        log::info!("[TimingWheel::start] tick thread started");
    }

    /// Signal the tick thread to exit and join it. Idempotent; also called
    /// from Drop.
    pub fn shutdown(&self) {
        let _guard = self.running_mutex.lock().unwrap_or_else(|e| e.into_inner());
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self
            .tick_thread
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        log::info!(
            "[TimingWheel::shutdown] stopped after {} ticks",
            self.tick_count.load(Ordering::SeqCst)
        );
    }

    /// Ticks since start.
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::SeqCst)
    }

    fn tick_loop(&self) {
        let mut deadline = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            deadline += Duration::from_millis(TIMER_RESOLUTION_MS);
            self.tick();
            self.tick_count.fetch_add(1, Ordering::SeqCst);
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind (debugger pause, machine load); re-anchor
                // rather than burst-tick to catch up.
                deadline = now;
            }
        }
    }

    /// Advance one resolution step: move the work index, cascade the
    /// assistant wheel on wrap, then drain the due work bucket into the
    /// scheduler.
    fn tick(&self) {
        let work_index =
            (self.current_work_index.load(Ordering::SeqCst) + 1) & (WORK_WHEEL_SIZE - 1);
        self.current_work_index.store(work_index, Ordering::SeqCst);

        if work_index == 0 {
            let assistant_index = (self.current_assistant_index.load(Ordering::SeqCst) + 1)
                & (ASSISTANT_WHEEL_SIZE - 1);
            self.current_assistant_index
                .store(assistant_index, Ordering::SeqCst);
            self.cascade(assistant_index);
        }

        for weak in self.work_wheel[work_index as usize].drain() {
            if weak.strong_count() == 0 {
                continue;
            }
            Scheduler::instance().dispatch(Box::new(move || {
                if let Some(task) = weak.upgrade() {
                    task.fire();
                }
            }));
        }
    }

    /// Redistribute the newly current assistant bucket into the work wheel
    /// according to each task's residual delay.
    fn cascade(&self, assistant_index: u64) {
        let work_index = self.current_work_index.load(Ordering::SeqCst);
        for weak in self.assistant_wheel[assistant_index as usize].drain() {
            let task = match weak.upgrade() {
                Some(task) => task,
                None => continue,
            };
            let remainder_ms = task.remainder_interval_ms.load(Ordering::SeqCst);
            let offset = remainder_ms.div_ceil(TIMER_RESOLUTION_MS);
            let slot = (work_index + offset) & (WORK_WHEEL_SIZE - 1);
            self.work_wheel[slot as usize].add_task(weak);
        }
    }

    /// Place a task by its planned delay (`next_fire_duration_ms`).
    ///
    /// Delays within one work-wheel rotation go straight onto the work
    /// wheel, `ceil(delay / resolution)` slots ahead of the current index.
    /// Longer delays go onto the assistant wheel at the rotation in which
    /// they come due, with the residual recorded for the cascade.
    pub fn add_task(self: Arc<Self>, task: &Arc<TimerTask>) {
        if !self.running.load(Ordering::SeqCst) {
            Arc::clone(&self).start();
        }

        let fire_ms = task.next_fire_duration_ms.load(Ordering::SeqCst);
        let offset_slots = fire_ms.div_ceil(TIMER_RESOLUTION_MS).max(1);
        let work_index = self.current_work_index.load(Ordering::SeqCst);

        if offset_slots <= WORK_WHEEL_SIZE {
            let slot = (work_index + offset_slots) & (WORK_WHEEL_SIZE - 1);
            log::debug!(
                "[TimingWheel::add_task] timer {} due in {} ms -> work slot {}",
                task.timer_id(),
                fire_ms,
                slot
            );
            self.work_wheel[slot as usize].add_task(Arc::downgrade(task));
            return;
        }

        // Slots remaining after the wheel next wraps.
        let slots_to_wrap = WORK_WHEEL_SIZE - work_index;
        let slots_after_wrap = offset_slots - slots_to_wrap;
        let rotations_ahead = 1 + slots_after_wrap / WORK_WHEEL_SIZE;
        let remainder_slots = slots_after_wrap % WORK_WHEEL_SIZE;

        task.remainder_interval_ms
            .store(remainder_slots * TIMER_RESOLUTION_MS, Ordering::SeqCst);
        let assistant_index = self.current_assistant_index.load(Ordering::SeqCst);
        let slot = (assistant_index + rotations_ahead) & (ASSISTANT_WHEEL_SIZE - 1);
        log::debug!(
            "[TimingWheel::add_task] timer {} due in {} ms -> assistant slot {} (residual {} ms)",
            task.timer_id(),
            fire_ms,
            slot,
            remainder_slots * TIMER_RESOLUTION_MS
        );
        self.assistant_wheel[slot as usize].add_task(Arc::downgrade(task));
    }
}

impl Drop for TimingWheel {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_len(bucket: &TimerBucket) -> usize {
        let drained = bucket.drain();
        let len = drained.len();
        for task in drained {
            bucket.add_task(task);
        }
        len
    }

    #[test]
    fn short_delay_lands_on_the_work_wheel() {
        let wheel = Arc::new(TimingWheel::new());
        wheel.running.store(true, Ordering::SeqCst); // keep add_task from spawning

        let task = Arc::new(TimerTask::new(1, 10, false));
        Arc::clone(&wheel).add_task(&task);

        // 10 ms at 2 ms resolution -> 5 slots ahead of index 0.
        assert_eq!(bucket_len(&wheel.work_wheel[5]), 1);
    }

    #[test]
    fn exact_rotation_delay_stays_on_the_work_wheel() {
        let wheel = Arc::new(TimingWheel::new());
        wheel.running.store(true, Ordering::SeqCst);

        let task = Arc::new(TimerTask::new(2, 1024, false));
        Arc::clone(&wheel).add_task(&task);

        // 512 slots ahead of index 0 wraps to index 0, one rotation out.
        assert_eq!(bucket_len(&wheel.work_wheel[0]), 1);
    }

    #[test]
    fn long_delay_parks_on_the_assistant_wheel_with_residual() {
        let wheel = Arc::new(TimingWheel::new());
        wheel.running.store(true, Ordering::SeqCst);

        let task = Arc::new(TimerTask::new(3, 2000, false));
        Arc::clone(&wheel).add_task(&task);

        // 1000 slots from index 0: wrap after 512, 488 slots of residual.
        assert_eq!(bucket_len(&wheel.assistant_wheel[1]), 1);
        assert_eq!(
            task.remainder_interval_ms.load(Ordering::SeqCst),
            488 * TIMER_RESOLUTION_MS
        );
    }

    #[test]
    fn cascade_moves_tasks_to_the_work_wheel() {
        let wheel = Arc::new(TimingWheel::new());
        wheel.running.store(true, Ordering::SeqCst);

        let task = Arc::new(TimerTask::new(4, 2000, false));
        task.remainder_interval_ms.store(100, Ordering::SeqCst);
        wheel.assistant_wheel[1].add_task(Arc::downgrade(&task));

        wheel.current_assistant_index.store(1, Ordering::SeqCst);
        wheel.cascade(1);

        // 100 ms residual -> 50 slots past the current work index (0).
        assert_eq!(bucket_len(&wheel.work_wheel[50]), 1);
        assert_eq!(bucket_len(&wheel.assistant_wheel[1]), 0);
    }

    #[test]
    fn dropped_timers_leave_only_dead_weak_refs() {
        let wheel = Arc::new(TimingWheel::new());
        wheel.running.store(true, Ordering::SeqCst);

        {
            let task = Arc::new(TimerTask::new(5, 10, false));
            Arc::clone(&wheel).add_task(&task);
        }
        let drained = wheel.work_wheel[5].drain();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].upgrade().is_none());
    }
}

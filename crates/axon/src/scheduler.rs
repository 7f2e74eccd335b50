// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Seam to the external task scheduler.
//!
//! The real scheduler that runs component callbacks is an external
//! collaborator; the core only needs three things from it: submit a task,
//! cancel every pending task belonging to one owner, and shut down. This
//! module provides that contract backed by a small pool of worker threads
//! draining a `crossbeam` channel.
//!
//! Wake-up callbacks and the timing-wheel tick thread hand work here; user
//! code never runs on the threads that produced it.

use crossbeam::channel::{self, Receiver, Sender};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::config;

/// A unit of work handed to the scheduler.
struct Job {
    /// Owner tag; pending jobs of a removed owner are skipped.
    owner: Option<String>,
    task: Box<dyn FnOnce() + Send>,
}

/// Process-wide scheduler seam.
pub struct Scheduler {
    tx: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    cancelled: Arc<DashMap<String, ()>>,
}

static INSTANCE: Mutex<Option<Arc<Scheduler>>> = Mutex::new(None);

impl Scheduler {
    /// Get the process-wide instance, creating it on first use.
    pub fn instance() -> Arc<Self> {
        let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert_with(|| Arc::new(Self::new(config::SCHEDULER_WORKER_NUM)))
            .clone()
    }

    /// Tear down the process-wide instance, joining its workers.
    pub fn reset() {
        let taken = {
            let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(sched) = taken {
            sched.shutdown();
        }
    }

    fn new(worker_num: usize) -> Self {
        let (tx, rx) = channel::unbounded::<Job>();
        let cancelled: Arc<DashMap<String, ()>> = Arc::new(DashMap::new());

        let mut workers = Vec::with_capacity(worker_num);
        for i in 0..worker_num {
            let rx: Receiver<Job> = rx.clone();
            let cancelled = Arc::clone(&cancelled);
            #[allow(clippy::expect_used)] // thread spawn failure is unrecoverable
            let handle = thread::Builder::new()
                .name(format!("axon-scheduler-{}", i))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        if let Some(owner) = &job.owner {
                            if cancelled.contains_key(owner) {
                                continue;
                            }
                        }
                        (job.task)();
                    }
                })
                .expect("Failed to spawn scheduler worker");
            workers.push(handle);
        }

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            cancelled,
        }
    }

    /// Submit a task with no owner.
    pub fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
        self.submit(Job { owner: None, task });
    }

    /// Submit a task on behalf of `owner` (typically a node name), so it can
    /// be cancelled wholesale by [`Scheduler::remove_task`].
    pub fn dispatch_tagged(&self, owner: &str, task: Box<dyn FnOnce() + Send>) {
        self.submit(Job {
            owner: Some(owner.to_string()),
            task,
        });
    }

    fn submit(&self, job: Job) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        match tx.as_ref() {
            Some(tx) => {
                // Unbounded channel: send only fails when workers are gone.
                let _ = tx.send(job);
            }
            None => {
                log::debug!("[Scheduler::submit] scheduler is shut down, task dropped");
            }
        }
    }

    /// Cancel every pending and future task tagged with `owner`.
    pub fn remove_task(&self, owner: &str) {
        self.cancelled.insert(owner.to_string(), ());
        log::debug!("[Scheduler::remove_task] tasks of {} cancelled", owner);
    }

    /// Stop accepting work and join the workers. In-flight tasks finish.
    pub fn shutdown(&self) {
        {
            let mut tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
            if tx.take().is_none() {
                return;
            }
        }
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        log::info!("[Scheduler::shutdown] workers joined");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn wait_for(check: impl Fn() -> bool) -> bool {
        for _ in 0..200 {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn dispatched_tasks_run() {
        let sched = Scheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            sched.dispatch(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert!(wait_for(|| counter.load(Ordering::SeqCst) == 8));
        sched.shutdown();
    }

    #[test]
    fn removed_owner_tasks_are_skipped() {
        let sched = Scheduler::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        sched.remove_task("dead_node");
        let counter = Arc::clone(&ran);
        sched.dispatch_tagged(
            "dead_node",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let counter = Arc::clone(&ran);
        sched.dispatch_tagged(
            "live_node",
            Box::new(move || {
                counter.fetch_add(10, Ordering::SeqCst);
            }),
        );

        assert!(wait_for(|| ran.load(Ordering::SeqCst) == 10));
        sched.shutdown();
    }

    #[test]
    fn shutdown_is_idempotent_and_drops_late_tasks() {
        let sched = Scheduler::new(1);
        sched.shutdown();
        sched.shutdown();
        // Task after shutdown is silently dropped.
        sched.dispatch(Box::new(|| panic!("must not run")));
    }
}

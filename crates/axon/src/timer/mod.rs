// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timers and the hierarchical timing wheel.
//!
//! # Architecture
//!
//! ```text
//! Timer (user facade)
//!   |  start() builds a TimerTask and registers it
//!   v
//! TimingWheel (singleton)
//!   work wheel:      512 buckets x 2 ms  -> intervals up to 1024 ms
//!   assistant wheel:  64 buckets         -> intervals up to 65536 ms
//!   |  tick thread drains the due bucket every 2 ms
//!   v
//! Scheduler -> TimerTask::fire() -> user callback (+ drift-compensated re-arm)
//! ```
//!
//! The tick thread only moves tasks; callbacks always run on scheduler
//! workers so the tick path stays bounded.

mod bucket;
mod task;
mod timing_wheel;

#[allow(clippy::module_inception)]
mod timer;

pub use task::TimerTask;
pub use timer::{Timer, TimerOption};
pub use timing_wheel::TimingWheel;

pub(crate) use bucket::TimerBucket;

use std::sync::OnceLock;
use std::time::Instant;

static MONO_ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since the first call in this process.
pub(crate) fn monotonic_now_ns() -> u64 {
    let anchor = MONO_ANCHOR.get_or_init(Instant::now);
    anchor.elapsed().as_nanos() as u64
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process lifecycle state.
//!
//! One process-wide flag separates the running phase from the shutdown
//! phase. The dispatcher consults it on every publish so that nothing is
//! filled or woken once teardown has begun.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// True while the process is running normally.
#[inline]
pub fn ok() -> bool {
    !SHUTDOWN.load(Ordering::SeqCst)
}

/// True once shutdown has been requested.
#[inline]
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Enter the shutdown phase. Idempotent.
pub fn set_shutdown() {
    if !SHUTDOWN.swap(true, Ordering::SeqCst) {
        log::info!("[state::set_shutdown] process entering shutdown");
    }
}

/// Return to the running phase.
///
/// Exists so tests (and long-lived harnesses that restart the runtime) can
/// reset the flag between scenarios.
pub fn reset() {
    SHUTDOWN.store(false, Ordering::SeqCst);
}

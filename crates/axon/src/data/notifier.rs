// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide table mapping channel id to wake-up callbacks.
//!
//! Callbacks run inline on the notifying thread (the dispatcher's), in
//! registration order. They are required to be non-blocking; in practice a
//! wake-up does nothing more than enqueue a drain task on the scheduler.

use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::channel::ChannelId;

/// One wake-up record.
pub struct Notifier {
    pub callback: Box<dyn Fn() + Send + Sync>,
}

/// Process-wide notifier table.
pub struct DataNotifier {
    notifies: DashMap<ChannelId, Vec<Arc<Notifier>>>,
}

static INSTANCE: Mutex<Option<Arc<DataNotifier>>> = Mutex::new(None);

impl DataNotifier {
    /// Get the process-wide instance, creating it on first use.
    pub fn instance() -> Arc<Self> {
        let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert_with(|| {
            Arc::new(Self {
                notifies: DashMap::new(),
            })
        })
        .clone()
    }

    /// Drop the process-wide instance so tests can start from a clean table.
    pub fn reset() {
        let mut slot = INSTANCE.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Register a wake-up record for `channel_id`. Records are never
    /// removed; a record whose target died is a cheap no-op on notify.
    pub fn add_notifier(&self, channel_id: ChannelId, notifier: Arc<Notifier>) {
        self.notifies.entry(channel_id).or_default().push(notifier);
        log::debug!(
            "[DataNotifier::add_notifier] channel {} now has a wake-up",
            channel_id
        );
    }

    /// Wake everyone subscribed to `channel_id`.
    ///
    /// Returns true iff the channel had at least one registered record. The
    /// record list is snapshotted first so no table lock is held while
    /// callbacks run.
    pub fn notify(&self, channel_id: ChannelId) -> bool {
        let snapshot: Vec<Arc<Notifier>> = match self.notifies.get(&channel_id) {
            Some(list) => list.clone(),
            None => return false,
        };
        for notifier in &snapshot {
            (notifier.callback)();
        }
        true
    }
}

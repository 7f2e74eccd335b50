// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-message-type dispatcher fanning publishes out to reader buffers.
//!
//! One dispatcher exists per message type `M`, held in a process-wide table
//! keyed by `TypeId`. The dispatcher maps each channel id to the weak set of
//! cache buffers subscribed to it; holding only weak references means a
//! reader can be destroyed without telling any publisher. Dead entries are
//! pruned lazily during dispatch.

use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use super::{CacheBuffer, ChannelBuffer, DataNotifier};
use crate::channel::ChannelId;
use crate::state;

type BufferVector<M> = Vec<Weak<CacheBuffer<Arc<M>>>>;

/// Router from one publish to every subscribed buffer of a channel.
pub struct DataDispatcher<M: Send + Sync + 'static> {
    buffers: DashMap<ChannelId, BufferVector<M>>,
}

static INSTANCES: OnceLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> = OnceLock::new();

fn instances() -> &'static Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
    INSTANCES.get_or_init(|| Mutex::new(HashMap::new()))
}

impl<M: Send + Sync + 'static> DataDispatcher<M> {
    /// Get the process-wide instance for message type `M`, creating it on
    /// first use.
    pub fn instance() -> Arc<Self> {
        let mut map = instances().lock().unwrap_or_else(|e| e.into_inner());
        let entry = map
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Arc::new(Self::new()) as Arc<dyn Any + Send + Sync>);
        #[allow(clippy::expect_used)] // the table is keyed by TypeId::of::<M>()
        let dispatcher = Arc::clone(entry)
            .downcast::<Self>()
            .expect("dispatcher entry keyed by its own TypeId");
        dispatcher
    }

    /// Drop the instance for `M` so tests can start from a clean table.
    pub fn reset() {
        let mut map = instances().lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&TypeId::of::<M>());
    }

    fn new() -> Self {
        Self {
            buffers: DashMap::new(),
        }
    }

    /// Subscribe a reader's buffer to its channel.
    ///
    /// Duplicates are permitted; each registered buffer receives each
    /// message once per registration.
    pub fn add_buffer(&self, channel_buffer: &ChannelBuffer<M>) {
        let weak = Arc::downgrade(channel_buffer.buffer());
        self.buffers
            .entry(channel_buffer.channel_id())
            .or_default()
            .push(weak);
        log::debug!(
            "[DataDispatcher::add_buffer] buffer added on channel {}",
            channel_buffer.channel_id()
        );
    }

    /// Fan `msg` out to every live buffer of `channel_id`, then wake the
    /// channel's subscribers.
    ///
    /// Returns false when the process is shutting down or the channel is
    /// unknown (nothing is woken in either case); otherwise returns the
    /// notifier's result, true iff at least one wake-up record existed.
    pub fn dispatch(&self, channel_id: ChannelId, msg: &Arc<M>) -> bool {
        if state::is_shutdown() {
            return false;
        }
        {
            let mut buffers = match self.buffers.get_mut(&channel_id) {
                Some(list) => list,
                None => return false,
            };
            buffers.retain(|weak| match weak.upgrade() {
                Some(buffer) => {
                    buffer.lock().fill(Arc::clone(msg));
                    true
                }
                None => false,
            });
        }
        // The map guard is released before wake-ups run.
        DataNotifier::instance().notify(channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Message types are the dispatcher key; each test uses its own to stay
    // independent of the process-wide tables.

    #[test]
    fn instance_is_shared_per_message_type() {
        struct KeyA;
        let first = DataDispatcher::<KeyA>::instance();
        let second = DataDispatcher::<KeyA>::instance();
        assert!(Arc::ptr_eq(&first, &second));
        DataDispatcher::<KeyA>::reset();
    }

    #[test]
    fn dispatch_unknown_channel_returns_false() {
        struct KeyB;
        let dispatcher = DataDispatcher::<KeyB>::new();
        assert!(!dispatcher.dispatch(99, &Arc::new(KeyB)));
    }

    #[test]
    fn dispatch_fills_every_registered_buffer() {
        let dispatcher = DataDispatcher::<u32>::new();
        let channel = crate::channel_id("dispatcher_test/fanout");
        let one = ChannelBuffer::<u32>::new(channel, 4);
        let two = ChannelBuffer::<u32>::new(channel, 4);
        dispatcher.add_buffer(&one);
        dispatcher.add_buffer(&two);

        for v in [10u32, 20, 30] {
            dispatcher.dispatch(channel, &Arc::new(v));
        }

        for buffer in [&one, &two] {
            let state = buffer.buffer().lock();
            assert_eq!(state.size(), 3);
            assert_eq!(state.front().map(|m| **m), Some(10));
            assert_eq!(state.back().map(|m| **m), Some(30));
        }
    }

    #[test]
    fn dead_buffers_are_pruned_lazily() {
        let dispatcher = DataDispatcher::<u64>::new();
        let channel = crate::channel_id("dispatcher_test/prune");
        let keeper = ChannelBuffer::<u64>::new(channel, 4);
        dispatcher.add_buffer(&keeper);
        {
            let doomed = ChannelBuffer::<u64>::new(channel, 4);
            dispatcher.add_buffer(&doomed);
        }

        dispatcher.dispatch(channel, &Arc::new(7));

        let entry = dispatcher.buffers.get(&channel).expect("channel registered");
        assert_eq!(entry.len(), 1, "dead weak reference pruned during dispatch");
        assert_eq!(keeper.buffer().lock().size(), 1);
    }

    #[test]
    fn duplicate_registration_fills_twice() {
        let dispatcher = DataDispatcher::<i32>::new();
        let channel = crate::channel_id("dispatcher_test/dup");
        let buffer = ChannelBuffer::<i32>::new(channel, 8);
        dispatcher.add_buffer(&buffer);
        dispatcher.add_buffer(&buffer);

        dispatcher.dispatch(channel, &Arc::new(5));
        assert_eq!(buffer.buffer().lock().size(), 2);
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber endpoint.
//!
//! A reader owns the channel buffer the dispatcher fills for it and keeps
//! two queues on top: `received` (drained from the ring by the wake-up
//! task) and `observed` (the snapshot user code iterates between
//! `observe()` calls). The wake-up registered with the notifier does
//! nothing but enqueue the drain on the scheduler, tagged with the node
//! name so a component shutdown cancels its pending drains.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::channel::{channel_id, ChannelId};
use crate::data::{ChannelBuffer, DataDispatcher, DataNotifier, Notifier};
use crate::scheduler::Scheduler;

/// Callback invoked for each message delivered to a reader.
pub type ReaderCallback<M> = Arc<dyn Fn(&Arc<M>) + Send + Sync>;

/// Type-erased reader surface for the node's reader map.
pub trait ReaderBase: Send + Sync {
    fn channel_name(&self) -> &str;
    fn channel_id(&self) -> ChannelId;
    fn observe(&self);
    fn clear_data(&self);
    fn shutdown(&self);
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Typed subscriber on one channel.
pub struct Reader<M: Send + Sync + 'static> {
    node_name: String,
    channel_name: String,
    channel_id: ChannelId,
    buffer: ChannelBuffer<M>,
    pending_queue_size: u64,
    /// Ring cursor of the drain task.
    cursor: Mutex<u64>,
    /// Messages drained from the ring, waiting for `observe()`.
    received: Mutex<VecDeque<Arc<M>>>,
    /// Snapshot handed to user code by the last `observe()`.
    observed: Mutex<VecDeque<Arc<M>>>,
    shutdown: AtomicBool,
}

impl<M: Send + Sync + 'static> Reader<M> {
    pub(crate) fn new(node_name: &str, channel_name: &str, pending_queue_size: u64) -> Arc<Self> {
        let id = channel_id(channel_name);
        Arc::new(Self {
            node_name: node_name.to_string(),
            channel_name: channel_name.to_string(),
            channel_id: id,
            buffer: ChannelBuffer::new(id, pending_queue_size),
            pending_queue_size,
            cursor: Mutex::new(0),
            received: Mutex::new(VecDeque::new()),
            observed: Mutex::new(VecDeque::new()),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Wire the reader into the fabric: subscribe its buffer with the
    /// dispatcher and register the wake-up that schedules the drain.
    pub(crate) fn init(reader: &Arc<Self>, callback: Option<ReaderCallback<M>>) {
        DataDispatcher::<M>::instance().add_buffer(&reader.buffer);

        let weak: Weak<Self> = Arc::downgrade(reader);
        let notifier = Arc::new(Notifier {
            callback: Box::new(move || {
                let reader = match weak.upgrade() {
                    Some(reader) => reader,
                    None => return,
                };
                let callback = callback.clone();
                let owner = reader.node_name.clone();
                Scheduler::instance().dispatch_tagged(
                    &owner,
                    Box::new(move || reader.drain(callback)),
                );
            }),
        });
        DataNotifier::instance().add_notifier(reader.channel_id, notifier);
    }

    /// Pull everything new out of the ring: run the user callback per
    /// message and append it to the received queue (bounded by the pending
    /// queue depth, oldest dropped).
    fn drain(&self, callback: Option<ReaderCallback<M>>) {
        if self.shutdown.load(Ordering::SeqCst) {
            return;
        }
        let mut cursor = self.cursor.lock();
        while let Some(msg) = self.buffer.fetch(&mut cursor) {
            if let Some(callback) = &callback {
                callback(&msg);
            }
            let mut received = self.received.lock();
            if received.len() as u64 >= self.pending_queue_size {
                received.pop_front();
            }
            received.push_back(msg);
        }
    }

    /// True once any message has been received.
    pub fn has_received(&self) -> bool {
        !self.received.lock().is_empty()
    }

    /// True while nothing is waiting to be observed.
    pub fn empty(&self) -> bool {
        self.received.lock().is_empty()
    }

    /// Newest message of the last `observe()` snapshot.
    pub fn get_latest_observed(&self) -> Option<Arc<M>> {
        self.observed.lock().back().cloned()
    }

    /// Iterate the last `observe()` snapshot in arrival order.
    pub fn observed_messages(&self) -> Vec<Arc<M>> {
        self.observed.lock().iter().cloned().collect()
    }
}

impl<M: Send + Sync + 'static> ReaderBase for Reader<M> {
    fn channel_name(&self) -> &str {
        &self.channel_name
    }

    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Move newly received messages into the observed snapshot.
    fn observe(&self) {
        let mut received = self.received.lock();
        let mut observed = self.observed.lock();
        observed.clear();
        observed.extend(received.drain(..));
    }

    fn clear_data(&self) {
        self.received.lock().clear();
        self.observed.lock().clear();
    }

    /// Detach from the fabric. Idempotent; the dispatcher prunes the dead
    /// buffer reference on its next dispatch once the reader is dropped.
    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!(
            "[Reader::shutdown] node {} leaving channel {}",
            self.node_name,
            self.channel_name
        );
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..400 {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn callback_sees_each_dispatched_message() {
        let reader = Reader::<u32>::new("reader_cb_node", "reader_test/cb", 8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        Reader::init(&reader, Some(Arc::new(move |msg: &Arc<u32>| {
            sink.lock().push(**msg);
        })));

        let dispatcher = DataDispatcher::<u32>::instance();
        for v in [10u32, 20, 30] {
            assert!(dispatcher.dispatch(reader.channel_id(), &Arc::new(v)));
        }

        assert!(wait_until(|| seen.lock().len() == 3));
        assert_eq!(*seen.lock(), vec![10, 20, 30]);
    }

    #[test]
    fn observe_snapshots_and_clear_data_resets() {
        let reader = Reader::<u32>::new("reader_obs_node", "reader_test/obs", 8);
        Reader::init(&reader, None);

        let dispatcher = DataDispatcher::<u32>::instance();
        dispatcher.dispatch(reader.channel_id(), &Arc::new(1));
        dispatcher.dispatch(reader.channel_id(), &Arc::new(2));

        assert!(wait_until(|| reader.has_received()));
        reader.observe();
        assert_eq!(reader.get_latest_observed().as_deref(), Some(&2));
        assert_eq!(reader.observed_messages().len(), 2);
        assert!(reader.empty());

        reader.clear_data();
        assert!(reader.get_latest_observed().is_none());
    }

    #[test]
    fn pending_queue_drops_oldest_beyond_depth() {
        let reader = Reader::<u32>::new("reader_depth_node", "reader_test/depth", 2);
        Reader::init(&reader, None);

        let dispatcher = DataDispatcher::<u32>::instance();
        for v in 1..=2u32 {
            dispatcher.dispatch(reader.channel_id(), &Arc::new(v));
        }
        assert!(wait_until(|| reader.has_received()));
        for v in 3..=4u32 {
            dispatcher.dispatch(reader.channel_id(), &Arc::new(v));
        }
        assert!(wait_until(|| {
            reader.observe();
            reader.get_latest_observed().as_deref() == Some(&4)
        }));
        assert!(reader.observed_messages().len() <= 2);
    }
}

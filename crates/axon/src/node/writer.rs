// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publisher endpoint.
//!
//! Writers publish into the in-process fabric through the per-type
//! dispatcher. Network transports sit behind the same dispatch call and are
//! external collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::channel::{channel_id, ChannelId};
use crate::data::DataDispatcher;

/// Typed publisher on one channel.
pub struct Writer<M: Send + Sync + 'static> {
    node_name: String,
    channel_name: String,
    channel_id: ChannelId,
    shutdown: AtomicBool,
    _marker: std::marker::PhantomData<fn(M)>,
}

impl<M: Send + Sync + 'static> Writer<M> {
    pub(crate) fn new(node_name: &str, channel_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            channel_name: channel_name.to_string(),
            channel_id: channel_id(channel_name),
            shutdown: AtomicBool::new(false),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Publish `msg`, taking shared ownership on behalf of all readers.
    ///
    /// Returns the dispatch result: false after shutdown or when nobody
    /// listens on the channel.
    pub fn write(&self, msg: M) -> bool {
        self.write_arc(&Arc::new(msg))
    }

    /// Publish an already-shared message without copying it.
    pub fn write_arc(&self, msg: &Arc<M>) -> bool {
        if self.shutdown.load(Ordering::SeqCst) {
            log::warn!(
                "[Writer::write] node {} writer on {} is shut down",
                self.node_name,
                self.channel_name
            );
            return false;
        }
        DataDispatcher::<M>::instance().dispatch(self.channel_id, msg)
    }

    /// Stop publishing. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ChannelBuffer;

    #[test]
    fn write_fills_subscribed_buffers() {
        let writer = Writer::<u32>::new("writer_node", "writer_test/basic");
        let buffer = ChannelBuffer::<u32>::new(writer.channel_id(), 4);
        DataDispatcher::<u32>::instance().add_buffer(&buffer);

        writer.write(41);
        writer.write(42);

        let state = buffer.buffer().lock();
        assert_eq!(state.size(), 2);
        assert_eq!(state.back().map(|m| **m), Some(42));
    }

    #[test]
    fn shutdown_writer_refuses_to_publish() {
        let writer = Writer::<u32>::new("writer_node", "writer_test/shutdown");
        writer.shutdown();
        assert!(!writer.write(1));
    }
}

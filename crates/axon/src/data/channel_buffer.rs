// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A channel id paired with the shared cache buffer subscribed to it.
//!
//! Readers drain through `fetch`, keeping their own cursor; a reader that
//! falls behind the ring's overwrite horizon is moved forward to the oldest
//! surviving message with a warning counting what it missed.

use std::sync::Arc;

use super::CacheBuffer;
use crate::channel::ChannelId;

/// Reader-side view of one channel's ring.
pub struct ChannelBuffer<M> {
    channel_id: ChannelId,
    buffer: Arc<CacheBuffer<Arc<M>>>,
}

impl<M> Clone for ChannelBuffer<M> {
    fn clone(&self) -> Self {
        Self {
            channel_id: self.channel_id,
            buffer: Arc::clone(&self.buffer),
        }
    }
}

impl<M> ChannelBuffer<M> {
    /// Create a buffer of `capacity` elements for `channel_id`.
    pub fn new(channel_id: ChannelId, capacity: u64) -> Self {
        Self {
            channel_id,
            buffer: Arc::new(CacheBuffer::new(capacity)),
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// The underlying ring; the dispatcher downgrades this for its
    /// subscription table.
    pub fn buffer(&self) -> &Arc<CacheBuffer<Arc<M>>> {
        &self.buffer
    }

    /// Fetch the message after `*cursor`, advancing the cursor.
    ///
    /// When the cursor has fallen behind the overwrite horizon it jumps to
    /// the oldest surviving message. Returns `None` when the reader is fully
    /// caught up.
    pub fn fetch(&self, cursor: &mut u64) -> Option<Arc<M>> {
        let state = self.buffer.lock();
        if state.empty() {
            return None;
        }
        let mut next = *cursor + 1;
        if next < state.head() {
            let dropped = state.head() - next;
            log::warn!(
                "[ChannelBuffer::fetch] channel {} reader fell behind, {} messages dropped",
                self.channel_id,
                dropped
            );
            next = state.head();
        }
        if next > state.tail() {
            return None;
        }
        *cursor = next;
        state.at(next).cloned()
    }

    /// Newest message on the channel, if any.
    pub fn latest(&self) -> Option<Arc<M>> {
        self.buffer.lock().back().cloned()
    }
}

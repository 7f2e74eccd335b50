// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node handle and reader/writer endpoints.
//!
//! Every component communicates through its node. A node exclusively owns
//! its readers, enforces channel uniqueness among them, and fans the
//! observe/clear helpers out over all of them. Node names are expected to
//! be unique within the process; the transport layer enforcing that is an
//! external collaborator.

mod reader;
mod writer;

pub use reader::{Reader, ReaderBase, ReaderCallback};
pub use writer::Writer;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::DEFAULT_PENDING_QUEUE_SIZE;
use crate::state;

/// Create a node, the per-component handle to the dispatch fabric.
///
/// Returns `None` with a warning once the process is shutting down.
pub fn create_node(node_name: &str, name_space: &str) -> Option<Arc<Node>> {
    if state::is_shutdown() {
        log::warn!(
            "[create_node] process is shutting down, node {} not created",
            node_name
        );
        return None;
    }
    Some(Arc::new(Node {
        node_name: node_name.to_string(),
        name_space: name_space.to_string(),
        readers: Mutex::new(HashMap::new()),
    }))
}

/// Per-component handle owning readers and writers.
pub struct Node {
    node_name: String,
    name_space: String,
    readers: Mutex<HashMap<String, Arc<dyn ReaderBase>>>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.node_name
    }

    pub fn name_space(&self) -> &str {
        &self.name_space
    }

    /// Create a reader on `channel_name` with the default pending queue.
    ///
    /// Refuses a second reader on a channel this node already reads
    /// (warning, `None`).
    pub fn create_reader<M: Send + Sync + 'static>(
        &self,
        channel_name: &str,
        callback: Option<ReaderCallback<M>>,
    ) -> Option<Arc<Reader<M>>> {
        self.create_reader_with_queue(channel_name, callback, DEFAULT_PENDING_QUEUE_SIZE as u64)
    }

    /// Create a reader with an explicit pending queue depth.
    pub fn create_reader_with_queue<M: Send + Sync + 'static>(
        &self,
        channel_name: &str,
        callback: Option<ReaderCallback<M>>,
        pending_queue_size: u64,
    ) -> Option<Arc<Reader<M>>> {
        let mut readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        if readers.contains_key(channel_name) {
            log::warn!(
                "[Node::create_reader] node {} already reads channel {}",
                self.node_name,
                channel_name
            );
            return None;
        }
        let reader = Reader::new(&self.node_name, channel_name, pending_queue_size);
        Reader::init(&reader, callback);
        let erased: Arc<dyn ReaderBase> = reader.clone();
        readers.insert(channel_name.to_string(), erased);
        Some(reader)
    }

    /// Create a writer publishing on `channel_name`.
    pub fn create_writer<M: Send + Sync + 'static>(&self, channel_name: &str) -> Arc<Writer<M>> {
        Arc::new(Writer::new(&self.node_name, channel_name))
    }

    /// Remove and destroy the reader on `channel_name`. True when one
    /// existed.
    pub fn delete_reader(&self, channel_name: &str) -> bool {
        let mut readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        match readers.remove(channel_name) {
            Some(reader) => {
                reader.shutdown();
                true
            }
            None => false,
        }
    }

    /// The typed reader on `channel_name`, if this node has one.
    pub fn get_reader<M: Send + Sync + 'static>(
        &self,
        channel_name: &str,
    ) -> Option<Arc<Reader<M>>> {
        let readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        let reader = readers.get(channel_name)?.clone();
        reader.as_any_arc().downcast::<Reader<M>>().ok()
    }

    /// Snapshot newly received data on every reader.
    pub fn observe(&self) {
        let readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        for reader in readers.values() {
            reader.observe();
        }
    }

    /// Clear received and observed data on every reader.
    pub fn clear_data(&self) {
        let readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        for reader in readers.values() {
            reader.clear_data();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_reader_is_refused_until_deleted() {
        let node = create_node("node_dup_reader", "").expect("process running");

        let first = node.create_reader::<u32>("node_test/dup", None);
        assert!(first.is_some());
        let second = node.create_reader::<u32>("node_test/dup", None);
        assert!(second.is_none());

        assert!(node.delete_reader("node_test/dup"));
        assert!(!node.delete_reader("node_test/dup"));

        let third = node.create_reader::<u32>("node_test/dup", None);
        assert!(third.is_some());
    }

    #[test]
    fn get_reader_downcasts_to_the_right_type() {
        let node = create_node("node_get_reader", "").expect("process running");
        node.create_reader::<u32>("node_test/typed", None)
            .expect("first reader");

        assert!(node.get_reader::<u32>("node_test/typed").is_some());
        assert!(node.get_reader::<u64>("node_test/typed").is_none());
        assert!(node.get_reader::<u32>("node_test/other").is_none());
    }

    #[test]
    fn writers_are_not_subject_to_channel_uniqueness() {
        let node = create_node("node_writers", "").expect("process running");
        let _one = node.create_writer::<u32>("node_test/out");
        let _two = node.create_writer::<u32>("node_test/out");
    }
}

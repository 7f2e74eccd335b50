// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Example component artifact.
//!
//! Builds a shared object the mainboard can load through a graph entry:
//!
//! ```json
//! {
//!     "modules": [{
//!         "module_library": "target/release/libaxon_demo_components.so",
//!         "components": [
//!             {"class_name": "ChatterRelay",
//!              "config": {"name": "relay", "readers": [{"channel": "demo/chatter"}]}}
//!         ],
//!         "timer_components": [
//!             {"class_name": "ChatterSource",
//!              "config": {"name": "source", "interval_ms": 500}}
//!         ]
//!     }]
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axon::component::{ComponentBase, ComponentCore};
use axon::node::Writer;
use axon::register_components;

/// Message exchanged on `demo/chatter`.
pub struct Chatter {
    pub seq: u64,
    pub text: String,
}

/// Timer-driven publisher: one `Chatter` per interval.
#[derive(Default)]
pub struct ChatterSource {
    core: ComponentCore,
    writer: Option<Arc<Writer<Chatter>>>,
    seq: AtomicU64,
}

impl ComponentBase for ChatterSource {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn init(&mut self) -> bool {
        let node = match self.core.node() {
            Some(node) => Arc::clone(node),
            None => return false,
        };
        self.writer = Some(node.create_writer::<Chatter>("demo/chatter"));
        true
    }

    fn proc(&mut self) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        if let Some(writer) = &self.writer {
            writer.write(Chatter {
                seq,
                text: format!("chatter {}", seq),
            });
        }
    }

    fn clear(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.shutdown();
        }
    }
}

/// Message-driven subscriber: logs every `Chatter` arriving on the channel
/// its graph entry names.
#[derive(Default)]
pub struct ChatterRelay {
    core: ComponentCore,
}

impl ComponentBase for ChatterRelay {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn init(&mut self) -> bool {
        let node = match self.core.node() {
            Some(node) => Arc::clone(node),
            None => return false,
        };
        let (channel, queue_size) = match self.core.config().readers.first() {
            Some(option) => (option.channel.clone(), option.pending_queue_size),
            None => {
                log::warn!("[ChatterRelay] graph entry lists no reader channel");
                return false;
            }
        };
        let reader = node.create_reader_with_queue::<Chatter>(
            &channel,
            Some(Arc::new(|msg: &Arc<Chatter>| {
                log::info!("[ChatterRelay] #{}: {}", msg.seq, msg.text);
            })),
            queue_size,
        );
        match reader {
            Some(reader) => {
                self.core.add_reader(reader);
                true
            }
            None => false,
        }
    }
}

register_components!(ChatterSource, ChatterRelay);

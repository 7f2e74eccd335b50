// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # axon - In-Process Component Hosting Runtime
//!
//! axon hosts many cooperating components inside one process and moves typed
//! messages between them with low, predictable latency. Components are
//! declared in a graph description file, instantiated from dynamically loaded
//! artifacts, and driven by message arrivals on named channels or by periodic
//! timer ticks.
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        Hosting Process                             |
//! |   ModuleController -> ClassLoaderManager -> ClassLoader            |
//! +--------------------------------------------------------------------+
//! |                        Component Layer                             |
//! |   ComponentBase -> Node -> Reader<M> / Writer<M>                   |
//! +--------------------------------------------------------------------+
//! |                        Dispatch Fabric                             |
//! |   DataDispatcher<M> -> CacheBuffer<M> -> DataNotifier -> Scheduler |
//! +--------------------------------------------------------------------+
//! |                        Timing Layer                                |
//! |   Timer -> TimingWheel (512 x 64 buckets, 2 ms resolution)         |
//! +--------------------------------------------------------------------+
//! ```
//!
//! ## Data Flow
//!
//! A publish on channel `c` fans out to every live `CacheBuffer` subscribed
//! to `c`, then the `DataNotifier` wakes the tasks reading `c`; the scheduler
//! runs their callbacks, which drain the buffers. Timer callbacks follow the
//! same hand-off: the wheel's tick thread never runs user code directly.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Node`] | Per-component handle owning readers and writers |
//! | [`data::DataDispatcher`] | Per-message-type router from publishers to buffers |
//! | [`timer::Timer`] | Oneshot or periodic task driven by the timing wheel |
//! | [`plugin::ClassLoader`] | Handle to one mapped component artifact |
//! | [`mainboard::ModuleController`] | Graph-driven instantiate/configure/activate |

/// Channel identity (name hashing).
pub mod channel;
/// Per-component abstraction owning readers and writers.
pub mod component;
/// Global configuration constants and path resolution.
pub mod config;
/// Dispatch fabric: cache buffers, dispatcher, notifier.
pub mod data;
/// Crate-wide error type.
pub mod error;
/// Graph loading and module lifecycle control.
pub mod mainboard;
/// Node handle and reader/writer endpoints.
pub mod node;
/// Dynamic class registry, loader and loader manager.
pub mod plugin;
/// Seam to the external task scheduler.
pub mod scheduler;
/// Process lifecycle state.
pub mod state;
/// Timers and the hierarchical timing wheel.
pub mod timer;

pub use channel::{channel_id, ChannelId};
pub use component::{ComponentBase, ComponentCore};
pub use error::{Error, Result};
pub use node::{create_node, Node, Reader, ReaderBase, Writer};

/// Shut the runtime down: flips the process state so subsequent dispatches
/// return `false`, stops the timing wheel and drains the scheduler.
///
/// Idempotent; meant to be called once by the hosting process on exit.
pub fn shutdown() {
    state::set_shutdown();
    timer::TimingWheel::reset();
    scheduler::Scheduler::reset();
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-component abstraction.
//!
//! A component is one unit of user work hosted by the process. Concrete
//! components implement [`ComponentBase`], embed a [`ComponentCore`] for
//! the framework-owned state, and get the lifecycle logic from the trait's
//! provided methods: `initialize` builds the node and resolves config
//! files before calling the component's own `init` hook; `shutdown` is
//! idempotent and tears the readers and scheduler tasks down.
//!
//! Message-driven components wire their typed readers and writers inside
//! `init` through `core().node()`, consulting the graph entry retained on
//! `core().config()` for channel names and queue depths; timer-driven
//! components override `proc` and are armed by the module controller, which
//! owns the shared handle a timer callback needs.

mod config;

pub use config::{ComponentConfig, ReaderOption, TimerComponentConfig, WriterOption};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config as runtime_config;
use crate::error::{Error, Result};
use crate::node::{create_node, Node, ReaderBase};
use crate::scheduler::Scheduler;

/// Framework-owned state embedded in every component.
#[derive(Default)]
pub struct ComponentCore {
    node: Option<Arc<Node>>,
    config: ComponentConfig,
    config_file_path: PathBuf,
    readers: Vec<Arc<dyn ReaderBase>>,
    timer_interval_ms: u64,
    is_shutdown: AtomicBool,
}

impl ComponentCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The component's node; present after `initialize`.
    pub fn node(&self) -> Option<&Arc<Node>> {
        self.node.as_ref()
    }

    /// The graph entry this component was initialized from; `init` reads
    /// its reader/writer descriptors to wire typed endpoints.
    pub fn config(&self) -> &ComponentConfig {
        &self.config
    }

    /// Resolved path of the component-private config file.
    pub fn config_file_path(&self) -> &Path {
        &self.config_file_path
    }

    /// Interval recorded from a timer component's graph entry.
    pub fn timer_interval_ms(&self) -> u64 {
        self.timer_interval_ms
    }

    /// Track a reader so shutdown can detach it.
    pub fn add_reader(&mut self, reader: Arc<dyn ReaderBase>) {
        self.readers.push(reader);
    }

    /// Deserialize the component-private config file.
    pub fn read_config<T: DeserializeOwned>(&self) -> Result<T> {
        let content = std::fs::read_to_string(&self.config_file_path).map_err(|_| {
            Error::ConfigFileNotFound(self.config_file_path.display().to_string())
        })?;
        serde_json::from_str(&content).map_err(|e| Error::ParseError(e.to_string()))
    }

    /// Resolve the graph entry's file references against the environment
    /// search paths, falling back to the literal path with a warning.
    fn load_config_files(&mut self, config_file_path: &str, flag_file_path: &str) {
        if !config_file_path.is_empty() {
            match runtime_config::resolve_with_env(config_file_path, runtime_config::CONF_PATH_ENV)
            {
                Some(path) => {
                    log::info!(
                        "[ComponentBase::initialize] using config file {}",
                        path.display()
                    );
                    self.config_file_path = path;
                }
                None => {
                    log::warn!(
                        "[ComponentBase::initialize] config file [{}] not found; \
                         using the literal path",
                        config_file_path
                    );
                    self.config_file_path = PathBuf::from(config_file_path);
                }
            }
        }
        if !flag_file_path.is_empty() {
            // Flag parsing belongs to the hosting process; resolution is
            // still reported here so a bad graph entry shows up early.
            match runtime_config::resolve_with_env(flag_file_path, runtime_config::FLAG_PATH_ENV) {
                Some(path) => {
                    log::info!(
                        "[ComponentBase::initialize] using flag file {}",
                        path.display()
                    );
                }
                None => {
                    log::warn!(
                        "[ComponentBase::initialize] flag file [{}] not found",
                        flag_file_path
                    );
                }
            }
        }
    }
}

/// Base of every hosted component; the class-registry base type.
///
/// Artifacts register concrete implementations under this trait through
/// [`register_components!`](crate::register_components).
pub trait ComponentBase: Send {
    /// Framework state accessor.
    fn core(&self) -> &ComponentCore;
    /// Framework state accessor.
    fn core_mut(&mut self) -> &mut ComponentCore;

    /// Component-specific setup; wire readers and writers here, using the
    /// transport descriptors on `core().config()` and the node on
    /// `core().node()`. Returning false fails the whole module load.
    fn init(&mut self) -> bool;

    /// Component-specific teardown, called once from `shutdown`.
    fn clear(&mut self) {}

    /// Periodic work of a timer-driven component.
    fn proc(&mut self) {}

    /// Framework entry point for message-driven components.
    fn initialize(&mut self, config: &ComponentConfig) -> bool {
        if config.name.is_empty() {
            log::warn!("[ComponentBase::initialize] component entry without a name");
            return false;
        }
        let node = match create_node(&config.name, "") {
            Some(node) => node,
            None => return false,
        };
        self.core_mut().node = Some(node);
        self.core_mut().config = config.clone();
        self.core_mut()
            .load_config_files(&config.config_file_path, &config.flag_file_path);
        if !self.init() {
            log::error!(
                "[ComponentBase::initialize] component {} init failed",
                config.name
            );
            return false;
        }
        true
    }

    /// Framework entry point for timer-driven components.
    fn initialize_timer(&mut self, config: &TimerComponentConfig) -> bool {
        if config.name.is_empty() {
            log::warn!("[ComponentBase::initialize_timer] component entry without a name");
            return false;
        }
        if config.interval_ms == 0 {
            log::warn!(
                "[ComponentBase::initialize_timer] component {} has no interval",
                config.name
            );
            return false;
        }
        let node = match create_node(&config.name, "") {
            Some(node) => node,
            None => return false,
        };
        self.core_mut().node = Some(node);
        self.core_mut().timer_interval_ms = config.interval_ms;
        self.core_mut()
            .load_config_files(&config.config_file_path, &config.flag_file_path);
        if !self.init() {
            log::error!(
                "[ComponentBase::initialize_timer] component {} init failed",
                config.name
            );
            return false;
        }
        true
    }

    /// Idempotent, cooperative teardown: in-flight callbacks finish, every
    /// reader detaches, and the component's scheduler tasks are cancelled.
    fn shutdown(&mut self) {
        if self.core().is_shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.clear();
        for reader in &self.core().readers {
            reader.shutdown();
        }
        if let Some(node) = self.core().node() {
            Scheduler::instance().remove_task(node.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingComponent {
        core: ComponentCore,
        init_calls: usize,
        clear_calls: usize,
        proc_calls: usize,
        fail_init: bool,
    }

    impl ComponentBase for CountingComponent {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn init(&mut self) -> bool {
            self.init_calls += 1;
            !self.fail_init
        }

        fn clear(&mut self) {
            self.clear_calls += 1;
        }

        fn proc(&mut self) {
            self.proc_calls += 1;
        }
    }

    #[test]
    fn initialize_creates_the_node_and_calls_init() {
        let mut component = CountingComponent::default();
        let config = ComponentConfig {
            name: "component_init_test".to_string(),
            ..Default::default()
        };

        assert!(component.initialize(&config));
        assert_eq!(component.init_calls, 1);
        let node = component.core().node().expect("node created");
        assert_eq!(node.name(), "component_init_test");
    }

    #[test]
    fn initialize_rejects_a_nameless_entry() {
        let mut component = CountingComponent::default();
        assert!(!component.initialize(&ComponentConfig::default()));
        assert_eq!(component.init_calls, 0);
    }

    #[test]
    fn failing_init_fails_initialize() {
        let mut component = CountingComponent {
            fail_init: true,
            ..Default::default()
        };
        let config = ComponentConfig {
            name: "component_fail_test".to_string(),
            ..Default::default()
        };
        assert!(!component.initialize(&config));
    }

    #[test]
    fn timer_initialize_requires_an_interval() {
        let mut component = CountingComponent::default();
        let config = TimerComponentConfig {
            name: "component_timer_test".to_string(),
            interval_ms: 0,
            ..Default::default()
        };
        assert!(!component.initialize_timer(&config));

        let config = TimerComponentConfig {
            name: "component_timer_test".to_string(),
            interval_ms: 50,
            ..Default::default()
        };
        assert!(component.initialize_timer(&config));
        assert_eq!(component.core().timer_interval_ms(), 50);
    }

    #[derive(Default)]
    struct WiredComponent {
        core: ComponentCore,
        seen_channels: Vec<String>,
    }

    impl ComponentBase for WiredComponent {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn init(&mut self) -> bool {
            self.seen_channels = self
                .core
                .config()
                .readers
                .iter()
                .map(|r| r.channel.clone())
                .collect();
            true
        }
    }

    #[test]
    fn init_sees_the_entry_transport_descriptors() {
        let mut component = WiredComponent::default();
        let config = ComponentConfig {
            name: "component_wired_test".to_string(),
            readers: vec![ReaderOption {
                channel: "sensors/imu".to_string(),
                message_type: String::new(),
                pending_queue_size: 4,
            }],
            writers: vec![WriterOption {
                channel: "state/pose".to_string(),
                message_type: String::new(),
            }],
            ..Default::default()
        };

        assert!(component.initialize(&config));
        assert_eq!(component.seen_channels, vec!["sensors/imu"]);
        assert_eq!(component.core().config().writers[0].channel, "state/pose");
        assert_eq!(component.core().config().readers[0].pending_queue_size, 4);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut component = CountingComponent::default();
        let config = ComponentConfig {
            name: "component_shutdown_test".to_string(),
            ..Default::default()
        };
        assert!(component.initialize(&config));

        component.shutdown();
        component.shutdown();
        assert_eq!(component.clear_calls, 1);
    }

    #[test]
    fn missing_private_config_surfaces_as_not_found() {
        let mut component = CountingComponent::default();
        let config = ComponentConfig {
            name: "component_conf_test".to_string(),
            config_file_path: "definitely/not/here.json".to_string(),
            ..Default::default()
        };
        assert!(component.initialize(&config));

        let parsed: Result<serde_json::Value> = component.core().read_config();
        assert!(matches!(parsed, Err(Error::ConfigFileNotFound(_))));
    }
}

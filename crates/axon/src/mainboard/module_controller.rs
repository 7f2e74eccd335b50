// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instantiate, configure and retain the components of a graph.
//!
//! Load order per graph file: map the module's artifact, construct each
//! listed component by `(ComponentBase, class_name)`, run its initialize
//! sequence, and retain the shared handle so the component outlives the
//! load scope. Timer components additionally get a periodic timer armed
//! with their `proc` hook; the controller owns those timers too.
//!
//! Any failure to map, construct or initialize a listed component is fatal
//! to the boot and propagates out as an error.

use std::sync::{Arc, Mutex};

use super::{DagConfig, ModuleArgument};
use crate::component::ComponentBase;
use crate::error::{Error, Result};
use crate::plugin::{ClassLoaderManager, ClassObj};
use crate::timer::{Timer, TimerOption};

type SharedComponent = Arc<Mutex<ClassObj<dyn ComponentBase>>>;

/// Drives the instantiate -> configure -> activate sequence of a graph.
pub struct ModuleController {
    args: ModuleArgument,
    class_loader_manager: ClassLoaderManager,
    component_list: Vec<SharedComponent>,
    timers: Vec<Timer>,
    total_component_num: usize,
    has_timer_component: bool,
}

impl ModuleController {
    pub fn new(args: ModuleArgument) -> Self {
        Self {
            args,
            class_loader_manager: ClassLoaderManager::new(),
            component_list: Vec::new(),
            timers: Vec::new(),
            total_component_num: 0,
            has_timer_component: false,
        }
    }

    /// Load everything the arguments reference.
    pub fn init(&mut self) -> Result<()> {
        self.load_all()
    }

    /// Components instantiated so far.
    pub fn component_num(&self) -> usize {
        self.total_component_num
    }

    /// True when any loaded graph carries a timer-driven component; the
    /// hosting process stays alive for those even with no readers.
    pub fn has_timer_component(&self) -> bool {
        self.has_timer_component
    }

    fn load_all(&mut self) -> Result<()> {
        for plugin in self.args.plugin_list.clone() {
            if !self.class_loader_manager.load_library(&plugin) {
                log::warn!(
                    "[ModuleController::load_all] plugin {} failed to load, continuing",
                    plugin
                );
            }
        }
        for dag_path in self.args.dag_conf_list.clone() {
            let dag = DagConfig::from_file(&dag_path)?;
            self.has_timer_component |= dag.has_timer_component();
            self.load_module(&dag)?;
        }
        log::info!(
            "[ModuleController::load_all] {} components loaded from {} graph file(s)",
            self.total_component_num,
            self.args.dag_conf_list.len()
        );
        Ok(())
    }

    fn load_module(&mut self, dag: &DagConfig) -> Result<()> {
        for module in &dag.modules {
            log::info!(
                "[ModuleController::load_module] loading {}",
                module.module_library
            );
            if !self.class_loader_manager.load_library(&module.module_library) {
                return Err(Error::LibraryLoadFailed(module.module_library.clone()));
            }

            for entry in &module.components {
                let mut component = self
                    .class_loader_manager
                    .create_class_obj::<dyn ComponentBase>(&entry.class_name, None)
                    .ok_or_else(|| Error::ClassNotFound(entry.class_name.clone()))?;
                if !component.initialize(&entry.config) {
                    return Err(Error::InvalidState(format!(
                        "component {} failed to initialize",
                        entry.class_name
                    )));
                }
                self.component_list.push(Arc::new(Mutex::new(component)));
                self.total_component_num += 1;
            }

            for entry in &module.timer_components {
                let mut component = self
                    .class_loader_manager
                    .create_class_obj::<dyn ComponentBase>(&entry.class_name, None)
                    .ok_or_else(|| Error::ClassNotFound(entry.class_name.clone()))?;
                if !component.initialize_timer(&entry.config) {
                    return Err(Error::InvalidState(format!(
                        "timer component {} failed to initialize",
                        entry.class_name
                    )));
                }
                let shared: SharedComponent = Arc::new(Mutex::new(component));

                let target = Arc::clone(&shared);
                let timer = Timer::new(TimerOption::new(
                    entry.config.interval_ms,
                    Arc::new(move || {
                        let mut component = target.lock().unwrap_or_else(|e| e.into_inner());
                        component.proc();
                    }),
                    false,
                ));
                if !timer.start() {
                    return Err(Error::InvalidArgument(format!(
                        "timer component {} interval {} ms rejected",
                        entry.class_name, entry.config.interval_ms
                    )));
                }
                self.timers.push(timer);
                self.component_list.push(shared);
                self.total_component_num += 1;
            }
        }
        Ok(())
    }

    /// Tear everything down: stop timers, shut components down, unload the
    /// artifacts. Safe to call after a failed `init`.
    pub fn clear(&mut self) {
        for timer in self.timers.drain(..) {
            timer.stop();
        }
        for component in &self.component_list {
            component
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .shutdown();
        }
        self.component_list.clear();
        self.class_loader_manager.unload_all_libraries();
    }
}

impl Drop for ModuleController {
    fn drop(&mut self) {
        self.clear();
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Arguments the hosting process hands to the module controller.

/// Parsed command-line surface of the hosting process.
///
/// The CLI itself lives in the `axon-mainboard` binary; the controller only
/// consumes this struct.
#[derive(Debug, Clone)]
pub struct ModuleArgument {
    /// Graph description files to load, in order.
    pub dag_conf_list: Vec<String>,
    /// Process group this mainboard belongs to.
    pub process_group: String,
    /// Scheduling policy name handed to the external scheduler.
    pub sched_name: String,
    /// Extra artifacts to map before any graph is loaded.
    pub plugin_list: Vec<String>,
}

impl Default for ModuleArgument {
    fn default() -> Self {
        Self {
            dag_conf_list: Vec::new(),
            process_group: "mainboard_default".to_string(),
            sched_name: "classic".to_string(),
            plugin_list: Vec::new(),
        }
    }
}

impl ModuleArgument {
    /// Arguments for the given graph files, everything else defaulted.
    pub fn new(dag_conf_list: Vec<String>) -> Self {
        Self {
            dag_conf_list,
            ..Default::default()
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Graph description file.
//!
//! A graph lists modules; each module names the artifact implementing it
//! and the components (message-driven and timer-driven) to instantiate
//! from it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::component::{ComponentConfig, TimerComponentConfig};
use crate::error::{Error, Result};

/// One message-driven component to instantiate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Concrete class name as registered by the artifact.
    pub class_name: String,
    #[serde(default)]
    pub config: ComponentConfig,
}

/// One timer-driven component to instantiate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerComponentEntry {
    /// Concrete class name as registered by the artifact.
    pub class_name: String,
    #[serde(default)]
    pub config: TimerComponentConfig,
}

/// One module: an artifact plus its component entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Artifact implementing the module's components.
    pub module_library: String,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    #[serde(default)]
    pub timer_components: Vec<TimerComponentEntry>,
}

/// A whole graph description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagConfig {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl DagConfig {
    /// Load a graph description from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| Error::ConfigFileNotFound(path.display().to_string()))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Total number of component entries, both kinds.
    pub fn component_count(&self) -> usize {
        self.modules
            .iter()
            .map(|m| m.components.len() + m.timer_components.len())
            .sum()
    }

    /// True when any module carries a timer-driven component.
    pub fn has_timer_component(&self) -> bool {
        self.modules.iter().any(|m| !m.timer_components.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "modules": [
            {
                "module_library": "lib/libperception.so",
                "components": [
                    {
                        "class_name": "LidarDriver",
                        "config": {
                            "name": "lidar_front",
                            "readers": [{"channel": "sensors/lidar_raw"}]
                        }
                    }
                ],
                "timer_components": [
                    {
                        "class_name": "HealthReporter",
                        "config": {"name": "health", "interval_ms": 500}
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn sample_graph_parses() {
        let dag: DagConfig = serde_json::from_str(SAMPLE).expect("sample parses");
        assert_eq!(dag.modules.len(), 1);
        assert_eq!(dag.component_count(), 2);
        assert!(dag.has_timer_component());
        assert_eq!(dag.modules[0].components[0].class_name, "LidarDriver");
        assert_eq!(
            dag.modules[0].timer_components[0].config.interval_ms,
            500
        );
    }

    #[test]
    fn from_file_round_trips() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(SAMPLE.as_bytes()).expect("write");

        let dag = DagConfig::from_file(file.path()).expect("file parses");
        assert_eq!(dag.component_count(), 2);
    }

    #[test]
    fn missing_file_reports_not_found() {
        let result = DagConfig::from_file("no/such/graph.json");
        assert!(matches!(result, Err(Error::ConfigFileNotFound(_))));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"{ modules: oops }").expect("write");

        let result = DagConfig::from_file(file.path());
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn empty_graph_has_no_timers() {
        let dag = DagConfig::default();
        assert_eq!(dag.component_count(), 0);
        assert!(!dag.has_timer_component());
    }
}

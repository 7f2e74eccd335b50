// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Component configuration carried by graph entries.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PENDING_QUEUE_SIZE;

fn default_pending_queue_size() -> u64 {
    DEFAULT_PENDING_QUEUE_SIZE as u64
}

/// Transport descriptor of one subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderOption {
    /// Channel the reader subscribes to.
    pub channel: String,
    /// Message type name, informational for tooling.
    #[serde(default)]
    pub message_type: String,
    /// Depth of the reader's pending queue.
    #[serde(default = "default_pending_queue_size")]
    pub pending_queue_size: u64,
}

/// Transport descriptor of one publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterOption {
    /// Channel the writer publishes on.
    pub channel: String,
    /// Message type name, informational for tooling.
    #[serde(default)]
    pub message_type: String,
}

/// Configuration of a message-driven component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Node name; must be unique within the process.
    #[serde(default)]
    pub name: String,
    /// Component-private config file, resolved against `APOLLO_CONF_PATH`.
    #[serde(default)]
    pub config_file_path: String,
    /// Flag file, resolved against `APOLLO_FLAG_PATH`.
    #[serde(default)]
    pub flag_file_path: String,
    #[serde(default)]
    pub readers: Vec<ReaderOption>,
    #[serde(default)]
    pub writers: Vec<WriterOption>,
}

/// Configuration of a timer-driven component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerComponentConfig {
    /// Node name; must be unique within the process.
    #[serde(default)]
    pub name: String,
    /// Firing interval in milliseconds.
    #[serde(default)]
    pub interval_ms: u64,
    /// Component-private config file, resolved against `APOLLO_CONF_PATH`.
    #[serde(default)]
    pub config_file_path: String,
    /// Flag file, resolved against `APOLLO_FLAG_PATH`.
    #[serde(default)]
    pub flag_file_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_option_defaults_apply() {
        let parsed: ReaderOption =
            serde_json::from_str(r#"{"channel": "sensors/imu"}"#).expect("minimal entry parses");
        assert_eq!(parsed.channel, "sensors/imu");
        assert_eq!(parsed.pending_queue_size, default_pending_queue_size());
        assert!(parsed.message_type.is_empty());
    }

    #[test]
    fn timer_config_parses_interval() {
        let parsed: TimerComponentConfig =
            serde_json::from_str(r#"{"name": "heartbeat", "interval_ms": 100}"#)
                .expect("timer entry parses");
        assert_eq!(parsed.interval_ms, 100);
    }
}

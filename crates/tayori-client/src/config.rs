//! Client configuration, loaded from RON.
//!
//! ```ron
//! (
//!     push_endpoint: "ws://localhost:8082",
//!     reconnect_delay_ms: 5000,
//!     connect_timeout_ms: 10000,
//!     merge_ordering: LastSettled,
//!     event_capacity: 256,
//! )
//! ```
//!
//! Every field is optional; missing ones take the defaults from
//! [`constants`](crate::constants).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tayori_store::MergeOrdering;

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_PUSH_ENDPOINT, RECONNECT_DELAY, STORE_EVENT_CAPACITY};

/// Error loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub push_endpoint: String,
    pub reconnect_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub merge_ordering: MergeOrdering,
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            push_endpoint: DEFAULT_PUSH_ENDPOINT.to_string(),
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            connect_timeout_ms: CONNECT_TIMEOUT.as_millis() as u64,
            merge_ordering: MergeOrdering::default(),
            event_capacity: STORE_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ClientConfig::from_ron("()").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.push_endpoint, "ws://localhost:8082");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig::from_ron(
            r#"(push_endpoint: "ws://push.example:9000", merge_ordering: IssueOrder)"#,
        )
        .unwrap();
        assert_eq!(config.push_endpoint, "ws://push.example:9000");
        assert_eq!(config.merge_ordering, MergeOrdering::IssueOrder);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tayori.ron");
        std::fs::write(&path, "(reconnect_delay_ms: 250)").unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.reconnect_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            ClientConfig::from_ron("(reconnect_delay_ms: \"soon\")"),
            Err(ConfigError::Ron(_))
        ));
        assert!(matches!(
            ClientConfig::load("/nonexistent/tayori.ron"),
            Err(ConfigError::Io(_))
        ));
    }
}

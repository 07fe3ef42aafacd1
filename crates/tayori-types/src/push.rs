//! Realtime push-channel wire format.
//!
//! Outbound: `{"action":"ready"}` once the socket opens.
//! Inbound: `{"notifications":{"count":<int>,"group":<string>}}`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Unread counter for a notification category.
///
/// Replaced wholesale on every push message. The count is taken as the
/// server sends it, negative or fractional values included; only a positive
/// count means unread.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: i64,
    #[serde(default)]
    pub group: String,
}

impl GroupCount {
    pub fn new(count: i64, group: impl Into<String>) -> Self {
        Self { count, group: group.into() }
    }

    pub fn has_unread(&self) -> bool {
        self.count > 0
    }
}

/// Accept any JSON number, a numeric string or null. Fractions truncate
/// toward zero; anything else reads as zero.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    };
    Ok(count.unwrap_or(0))
}

/// Inbound server message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub notifications: GroupCount,
}

impl PushMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Outbound client message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Readiness handshake; the server starts streaming after it.
    Ready,
}

impl ClientMessage {
    pub fn to_text(&self) -> String {
        match self {
            ClientMessage::Ready => r#"{"action":"ready"}"#.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Client configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Push endpoint the notifications surface connects to.
pub const DEFAULT_PUSH_ENDPOINT: &str = "ws://localhost:8082";

/// Fixed delay between a push channel closing and the next connect attempt.
/// Not exponential; there is no retry limit.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on a single WebSocket connect + handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Broadcast buffer for store events.
pub const STORE_EVENT_CAPACITY: usize = tayori_store::DEFAULT_EVENT_CAPACITY;

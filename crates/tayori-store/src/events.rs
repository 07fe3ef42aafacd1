//! Store change notifications.
//!
//! Broadcast to every [`StoreHandle::subscribe`](crate::StoreHandle::subscribe)
//! receiver after the actor applies a command. Views re-read the domain they
//! care about when its version moves.

/// Events published by the store actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A merge changed a domain.
    Changed { domain: &'static str, version: u64 },
    /// The in-flight count of an operation moved.
    Pending { operation: String, in_flight: usize },
}

impl StoreEvent {
    /// Whether this event reports a change to `name`.
    pub fn touches(&self, name: &str) -> bool {
        matches!(self, StoreEvent::Changed { domain, .. } if *domain == name)
    }
}

//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while applying or reading store state.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No domain registered under this name.
    #[error("unknown domain: {0}")]
    UnknownDomain(String),

    /// Wire action type is not `"<domain>/<action>"`.
    #[error("malformed action type {0:?}, expected \"<domain>/<action>\"")]
    MalformedActionType(String),

    /// Wire action name or payload did not match the domain's actions.
    #[error("cannot decode {domain}/{action}: {source}")]
    Decode {
        domain: &'static str,
        action: String,
        source: serde_json::Error,
    },

    /// A typed merge request carried another domain's action type.
    #[error("merge request for {0} carries a foreign action type")]
    ActionTypeMismatch(&'static str),

    /// Server snapshot for a domain did not match its state shape.
    #[error("cannot hydrate {domain}: {source}")]
    Hydrate {
        domain: &'static str,
        source: serde_json::Error,
    },

    /// Domain state could not be serialized.
    #[error("cannot snapshot {domain}: {source}")]
    Snapshot {
        domain: &'static str,
        source: serde_json::Error,
    },

    /// The store actor is gone.
    #[error("store shut down")]
    Shutdown,
}

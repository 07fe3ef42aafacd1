//! Service-call contract.
//!
//! The HTTP layer is a collaborator: it takes an operation name and a flat
//! key/value payload and resolves to an [`Envelope`]. Rejection is reserved
//! for transport failures; business failures come back as `result = false`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tayori_types::{Envelope, Fields};
use thiserror::Error;

/// Transport-level failure of a service call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Performs fetches and mutations against the server.
#[async_trait]
pub trait Service: Send + Sync {
    async fn call(&self, operation: &str, payload: Fields) -> Result<Envelope<Value>, ServiceError>;
}

#[async_trait]
impl<S: Service + ?Sized> Service for Arc<S> {
    async fn call(&self, operation: &str, payload: Fields) -> Result<Envelope<Value>, ServiceError> {
        (**self).call(operation, payload).await
    }
}

/// A service with no backend; every call is rejected.
///
/// For surfaces that only consume the push channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineService;

#[async_trait]
impl Service for OfflineService {
    async fn call(&self, operation: &str, _payload: Fields) -> Result<Envelope<Value>, ServiceError> {
        Err(ServiceError::Unavailable(format!("{operation}: offline")))
    }
}

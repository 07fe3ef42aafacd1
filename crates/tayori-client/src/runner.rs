//! Action runner: one service call, one pending marker, at most one merge.
//!
//! ```text
//!   begin(op) ──▶ service call ──▶ end(op) ──▶ result? ──▶ merge request ──▶ store
//!                      │                          │
//!                      └── rejected ──────────────┴── no merge, envelope returned
//! ```
//!
//! The pending marker is an RAII guard, so a run that is dropped mid-call
//! (its component went away) still settles the operation's in-flight count.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tayori_store::{Applied, MergeRequest, StoreError, StoreHandle, Ticket};
use tayori_types::Envelope;
use thiserror::Error;
use tracing::Instrument;

use crate::service::ServiceError;

/// Errors from running an action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("service call failed: {0}")]
    Service(#[from] ServiceError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid payload for {operation}: {source}")]
    Payload {
        operation: String,
        source: serde_json::Error,
    },
}

/// Marks one invocation of an operation as in flight until dropped.
struct InFlight<'a> {
    store: &'a StoreHandle,
    operation: &'a str,
}

impl<'a> InFlight<'a> {
    fn acquire(store: &'a StoreHandle, operation: &'a str) -> Result<Self, StoreError> {
        store.begin(operation)?;
        Ok(Self { store, operation })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.store.end(self.operation).is_err() {
            tracing::debug!(operation = self.operation, "store gone before operation settled");
        }
    }
}

/// Runs service calls and turns successful envelopes into merges.
#[derive(Clone)]
pub struct ActionRunner {
    store: StoreHandle,
    seq: Arc<AtomicU64>,
}

impl ActionRunner {
    pub fn new(store: StoreHandle) -> Self {
        Self { store, seq: Arc::new(AtomicU64::new(0)) }
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Run `call` as `operation`.
    ///
    /// `merge` sees the envelope only when `result` is true and may return a
    /// request for the store. Every request carries a [`Ticket`] scoped to
    /// `operation` with this run's issue number; the store only consults it under
    /// [`MergeOrdering::IssueOrder`](tayori_store::MergeOrdering::IssueOrder).
    ///
    /// The envelope is returned unchanged whatever its flag. A rejected call
    /// yields [`ActionError::Service`] and no merge.
    pub async fn run<D, Fut, M>(&self, operation: &str, call: Fut, merge: M) -> Result<Envelope<D>, ActionError>
    where
        Fut: Future<Output = Result<Envelope<D>, ServiceError>>,
        M: FnOnce(&Envelope<D>) -> Option<MergeRequest>,
    {
        self.run_scoped(operation, operation, call, merge).await
    }

    /// Like [`run`](Self::run), but tickets the merge under `scope`.
    ///
    /// Use a scope narrower than the operation when one operation feeds
    /// several independent targets, so a newer merge into one target does
    /// not make an older merge into another look stale.
    pub async fn run_scoped<D, Fut, M>(
        &self,
        operation: &str,
        scope: &str,
        call: Fut,
        merge: M,
    ) -> Result<Envelope<D>, ActionError>
    where
        Fut: Future<Output = Result<Envelope<D>, ServiceError>>,
        M: FnOnce(&Envelope<D>) -> Option<MergeRequest>,
    {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let span = tracing::info_span!("action.run", operation, scope, seq);

        async move {
            let settled = {
                let _in_flight = InFlight::acquire(&self.store, operation)?;
                call.await
            };

            let envelope = match settled {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "service call rejected");
                    return Err(e.into());
                }
            };

            if !envelope.is_ok() {
                tracing::debug!(message = ?envelope.message, "service reported failure");
                return Ok(envelope);
            }

            if let Some(request) = merge(&envelope) {
                let request = request.with_ticket(Ticket::new(scope, seq));
                match self.store.apply(request).await? {
                    Applied::Changed { domain, version } => {
                        tracing::debug!(domain, version, "merged");
                    }
                    Applied::Discarded { domain } => {
                        tracing::debug!(domain, "merge superseded by a later issue");
                    }
                }
            }
            Ok::<_, ActionError>(envelope)
        }
        .instrument(span)
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

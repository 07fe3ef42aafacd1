//! Domains and merge requests.
//!
//! A [`Domain`] is one slice of store state ("explore", "notifications", …)
//! with a closed set of data-only actions. Its reducer composes merge-engine
//! calls; the store never mutates domain state any other way.
//!
//! Actions travel two ways:
//!
//! ```text
//!   typed   MergeRequest::new::<D>(action) ──▶ Box<dyn Any> ──▶ downcast ──▶ D::reduce
//!   wire    { "type": "explore/setWriter", "payload": {...} } ──▶ serde ──▶ D::reduce
//! ```

use std::any::Any;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::StoreError;

/// One named slice of store state.
///
/// `Action` is deserialized adjacently tagged, `{ "type": <name>, "payload": ... }`,
/// so enums should use `#[serde(tag = "type", content = "payload", rename_all = "camelCase")]`.
pub trait Domain: Default + Serialize + DeserializeOwned + Send + 'static {
    const NAME: &'static str;

    type Action: DeserializeOwned + fmt::Debug + Send + 'static;

    /// Apply one action, returning the next state.
    fn reduce(self, action: Self::Action) -> Self;
}

/// Orders merges into one target when stale results must be dropped.
///
/// `scope` names what the merge overwrites: usually the operation, or the
/// operation plus a list key when one operation feeds several lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub scope: String,
    pub seq: u64,
}

impl Ticket {
    pub fn new(scope: impl Into<String>, seq: u64) -> Self {
        Self { scope: scope.into(), seq }
    }
}

/// A typed, payload-carrying instruction for one domain.
pub struct MergeRequest {
    domain: &'static str,
    label: String,
    action: Box<dyn Any + Send>,
    ticket: Option<Ticket>,
}

impl MergeRequest {
    pub fn new<D: Domain>(action: D::Action) -> Self {
        Self {
            domain: D::NAME,
            label: format!("{action:?}"),
            action: Box::new(action),
            ticket: None,
        }
    }

    pub fn with_ticket(mut self, ticket: Ticket) -> Self {
        self.ticket = Some(ticket);
        self
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub(crate) fn into_action(self) -> Box<dyn Any + Send> {
        self.action
    }
}

impl fmt::Debug for MergeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeRequest")
            .field("domain", &self.domain)
            .field("action", &self.label)
            .field("ticket", &self.ticket)
            .finish()
    }
}

/// Split `"<domain>/<action>"`.
pub fn split_action_type(action_type: &str) -> Result<(&str, &str), StoreError> {
    match action_type.split_once('/') {
        Some((domain, action)) if !domain.is_empty() && !action.is_empty() => Ok((domain, action)),
        _ => Err(StoreError::MalformedActionType(action_type.to_string())),
    }
}

// ============================================================================
// Type erasure
// ============================================================================

/// Object-safe view of a registered domain.
pub(crate) trait DynDomain: Send {
    fn apply_boxed(&mut self, action: Box<dyn Any + Send>) -> Result<(), StoreError>;
    fn apply_wire(&mut self, action: &str, payload: Value) -> Result<(), StoreError>;
    fn hydrate(&mut self, snapshot: Value) -> Result<(), StoreError>;
    fn snapshot(&self) -> Result<Value, StoreError>;
    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct Slot<D>(pub(crate) D);

impl<D: Domain> Slot<D> {
    fn reduce(&mut self, action: D::Action) {
        log::trace!("{} reduce {:?}", D::NAME, action);
        let state = std::mem::take(&mut self.0);
        self.0 = state.reduce(action);
    }
}

impl<D: Domain> DynDomain for Slot<D> {
    fn apply_boxed(&mut self, action: Box<dyn Any + Send>) -> Result<(), StoreError> {
        let action = action
            .downcast::<D::Action>()
            .map_err(|_| StoreError::ActionTypeMismatch(D::NAME))?;
        self.reduce(*action);
        Ok(())
    }

    fn apply_wire(&mut self, action: &str, payload: Value) -> Result<(), StoreError> {
        let tagged = json!({ "type": action, "payload": payload });
        let decoded: D::Action = serde_json::from_value(tagged).map_err(|source| StoreError::Decode {
            domain: D::NAME,
            action: action.to_string(),
            source,
        })?;
        self.reduce(decoded);
        Ok(())
    }

    fn hydrate(&mut self, snapshot: Value) -> Result<(), StoreError> {
        self.0 = serde_json::from_value(snapshot)
            .map_err(|source| StoreError::Hydrate { domain: D::NAME, source })?;
        Ok(())
    }

    fn snapshot(&self) -> Result<Value, StoreError> {
        serde_json::to_value(&self.0).map_err(|source| StoreError::Snapshot { domain: D::NAME, source })
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

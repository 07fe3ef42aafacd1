//! Collection merge engine and derived state store for Tayori.
//!
//! # Layers
//!
//! - [`merge`]: pure functions reconciling a page, a removal, or a nested
//!   patch into an identity-keyed [`Collection`].
//! - [`Domain`]: one named slice of state whose reducer composes merges.
//! - [`Store`]: every registered domain plus the pending-operation set.
//! - [`StoreHandle`]: cloneable front of the actor task that owns the
//!   [`Store`]; the only way other components submit merge requests.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), tayori_store::StoreError> {
//! use serde_json::json;
//! use tayori_store::StoreBuilder;
//!
//! let store = StoreBuilder::new()
//!     .with_builtin_domains()
//!     .hydrate(&json!({ "explore": { "recommends": { "list": [] } } }))?
//!     .spawn();
//!
//! store.dispatch("notifications/setGroupCount", json!({ "count": 2, "group": "like" })).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod collection;
pub mod domain;
pub mod domains;
mod error;
pub mod events;
pub mod merge;
pub mod store;

pub use actor::{DEFAULT_EVENT_CAPACITY, StoreBuilder, StoreHandle};
pub use collection::{Collection, Collections};
pub use domain::{Domain, MergeRequest, Ticket};
pub use error::StoreError;
pub use events::StoreEvent;
pub use store::{Applied, MergeOrdering, Store};

//! Tayori client runtime.
//!
//! Everything between the store and the outside world:
//!
//! - [`ActionRunner`] wraps one service call with the operation's pending
//!   marker and turns a successful envelope into at most one merge.
//! - [`operations`] are the built-in fetches and mutations.
//! - [`Dispatcher`] routes `{ type, payload }` actions to an operation or
//!   straight to the store.
//! - [`ChannelHandle`] keeps the realtime push channel connected and feeds
//!   the unread counter into the store.
//! - [`NotificationsSurface`] ties the channel to popover visibility and
//!   sends read receipts.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use tayori_client::{ActionRunner, ClientConfig, NotificationsSurface, OfflineService, WsConnector};
//! use tayori_store::StoreBuilder;
//!
//! let config = ClientConfig::default();
//! let store = StoreBuilder::new().ordering(config.merge_ordering).with_builtin_domains().spawn();
//! let runner = ActionRunner::new(store);
//!
//! let surface = NotificationsSurface::mount(
//!     Arc::new(WsConnector::new(config.connect_timeout())),
//!     (&config).into(),
//!     runner,
//!     Arc::new(OfflineService),
//! );
//! surface.set_visible(true);
//! surface.unmount().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod operations;
pub mod realtime;
pub mod runner;
pub mod service;
pub mod surface;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use dispatch::{Dispatcher, Operation, Outcome};
pub use operations::FetchParams;
pub use realtime::{ChannelConfig, ChannelHandle, ChannelState};
pub use runner::{ActionError, ActionRunner};
pub use service::{OfflineService, Service, ServiceError};
pub use surface::{NotificationsSurface, ReadGate};
pub use transport::{ChannelError, PushConnection, PushConnector, WsConnector};

//! Realtime push channel.
//!
//! A background task keeps one connection to the push endpoint open for as
//! long as its owner is mounted:
//!
//! ```text
//!   Disconnected ──▶ Connecting ──▶ Open ──(peer close / error)──▶ Closed
//!        ▲                                                          │
//!        │                                   sleep(reconnect_delay) │
//!   teardown ◀── any state                       Connecting ◀───────┘
//! ```
//!
//! On open the client sends the readiness handshake; every inbound message
//! replaces the notifications group count in the store. A message with
//! unread items also flips the [`force`](ChannelHandle::force) toggle, the
//! signal for the badge to re-render even when the count repeats.
//!
//! Teardown cancels the task wherever it is. A pending reconnect sleep is
//! abandoned, so no attempt is made after teardown, and an open connection
//! is closed exactly once.

use std::sync::Arc;
use std::time::Duration;

use tayori_store::domains::{Notifications, NotificationsAction};
use tayori_store::{MergeRequest, StoreHandle};
use tayori_types::{ClientMessage, PushMessage};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::constants::{DEFAULT_PUSH_ENDPOINT, RECONNECT_DELAY};
use crate::transport::{ChannelError, PushConnection, PushConnector};

/// Connection lifecycle of the push channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { endpoint: DEFAULT_PUSH_ENDPOINT.to_string(), reconnect_delay: RECONNECT_DELAY }
    }
}

impl From<&ClientConfig> for ChannelConfig {
    fn from(config: &ClientConfig) -> Self {
        Self { endpoint: config.push_endpoint.clone(), reconnect_delay: config.reconnect_delay() }
    }
}

// ============================================================================
// ChannelHandle
// ============================================================================

/// Owner's side of a running channel. Dropping it tears the channel down.
pub struct ChannelHandle {
    state: watch::Receiver<ChannelState>,
    force: watch::Receiver<bool>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    /// Start the channel task on the current runtime.
    pub fn spawn(connector: Arc<dyn PushConnector>, config: ChannelConfig, store: StoreHandle) -> Self {
        let (state_tx, state) = watch::channel(ChannelState::Disconnected);
        let (force_tx, force) = watch::channel(false);
        let cancel = CancellationToken::new();

        let span = tracing::info_span!("channel.run", endpoint = %config.endpoint);
        let channel = Channel { connector, config, store, state: state_tx, force: force_tx, cancel: cancel.clone() };
        let task = tokio::spawn(channel.run().instrument(span));

        Self { state, force, cancel, task: Some(task) }
    }

    pub fn state(&self) -> ChannelState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.state.clone()
    }

    /// Toggles on every message that carries unread items.
    pub fn force(&self) -> watch::Receiver<bool> {
        self.force.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the channel and wait for the task to finish. Idempotent.
    pub async fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "push channel task failed");
            }
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Channel task (internal)
// ============================================================================

enum SessionEnd {
    /// Peer closed the connection.
    Closed,
    Failed(ChannelError),
    /// Teardown requested.
    Cancelled,
}

struct Channel {
    connector: Arc<dyn PushConnector>,
    config: ChannelConfig,
    store: StoreHandle,
    state: watch::Sender<ChannelState>,
    force: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl Channel {
    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
    }

    async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.set_state(ChannelState::Connecting);

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.connector.connect(&self.config.endpoint) => result,
            };

            match connected {
                Ok(mut conn) => {
                    tracing::info!(attempt, "push channel open");
                    attempt = 0;
                    self.set_state(ChannelState::Open);

                    match self.session(conn.as_mut()).await {
                        SessionEnd::Cancelled => {
                            conn.close().await;
                            break;
                        }
                        SessionEnd::Closed => tracing::info!("push channel closed by peer"),
                        SessionEnd::Failed(e) => {
                            tracing::warn!(error = %e, "push channel error");
                            self.set_state(ChannelState::Error(e.to_string()));
                            conn.close().await;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "push channel connect failed");
                    self.set_state(ChannelState::Error(e.to_string()));
                }
            }

            self.set_state(ChannelState::Closed);
            tracing::debug!(delay_ms = self.config.reconnect_delay.as_millis() as u64, "reconnect scheduled");

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.set_state(ChannelState::Disconnected);
        tracing::debug!("push channel stopped");
    }

    async fn session(&self, conn: &mut dyn PushConnection) -> SessionEnd {
        if let Err(e) = conn.send_text(ClientMessage::Ready.to_text()).await {
            return SessionEnd::Failed(e);
        }

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                next = conn.recv_text() => next,
            };
            match next {
                None => return SessionEnd::Closed,
                Some(Err(e)) => return SessionEnd::Failed(e),
                Some(Ok(text)) => self.on_message(&text).await,
            }
        }
    }

    async fn on_message(&self, text: &str) {
        let counter = match PushMessage::parse(text) {
            Ok(message) => message.notifications,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed push message");
                return;
            }
        };

        if counter.has_unread() {
            self.force.send_modify(|force| *force = !*force);
        }

        let request = MergeRequest::new::<Notifications>(NotificationsAction::SetGroupCount(counter));
        if let Err(e) = self.store.apply(request).await {
            tracing::warn!(error = %e, "group count not merged");
        }
    }
}

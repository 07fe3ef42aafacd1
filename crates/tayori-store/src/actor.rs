//! Actor that owns the store.
//!
//! All state lives in one task. Writers (the action runner, the realtime
//! channel, UI dispatch) hold a cloneable [`StoreHandle`] and send commands;
//! the actor applies them one at a time in arrival order, so no two merges
//! ever interleave.
//!
//! ```text
//!   StoreHandle (Clone+Send+Sync)   mpsc     StoreActor (tokio task)
//!   ┌──────────────────────────┐  ───────▶  ┌───────────────────────────┐
//!   │ .apply(MergeRequest)     │            │ Store (domains, pending)  │
//!   │ .dispatch(type, payload) │  ◀───────  │ sequential apply          │
//!   │ .begin(op) / .end(op)    │   oneshot  │ broadcast StoreEvent      │
//!   └──────────────────────────┘            └───────────────────────────┘
//! ```

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::domain::{Domain, MergeRequest};
use crate::domains::{Bank, Explore, Notifications, UserArticle, Withdraw};
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::store::{Applied, MergeOrdering, Store};

/// Default broadcast buffer for [`StoreEvent`]s. Slow subscribers past this lag.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

// ============================================================================
// Commands (internal)
// ============================================================================

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum StoreCommand {
    Apply {
        request: MergeRequest,
        reply: Reply<Applied>,
    },
    Dispatch {
        action_type: String,
        payload: Value,
        reply: Reply<Applied>,
    },
    Read {
        f: Box<dyn FnOnce(&Store) + Send>,
    },
    Snapshot {
        domain: String,
        reply: Reply<Value>,
    },
    Begin {
        operation: String,
    },
    End {
        operation: String,
    },
}

// ============================================================================
// StoreHandle (Send + Sync public API)
// ============================================================================

/// Cloneable handle to the store actor.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreHandle {
    /// Apply a typed merge request and wait for the outcome.
    pub async fn apply(&self, request: MergeRequest) -> Result<Applied, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StoreCommand::Apply { request, reply })
            .map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)?
    }

    /// Apply a wire-form action, `action_type` being `"<domain>/<action>"`.
    pub async fn dispatch(&self, action_type: &str, payload: Value) -> Result<Applied, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StoreCommand::Dispatch {
            action_type: action_type.to_string(),
            payload,
            reply,
        }).map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)?
    }

    /// Run `f` against a domain's current state.
    pub async fn read<D, R, F>(&self, f: F) -> Result<R, StoreError>
    where
        D: Domain,
        R: Send + 'static,
        F: FnOnce(&D) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let f = Box::new(move |store: &Store| {
            let result = store
                .read::<D>()
                .map(f)
                .ok_or_else(|| StoreError::UnknownDomain(D::NAME.to_string()));
            let _ = reply.send(result);
        });
        self.tx.send(StoreCommand::Read { f }).map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)?
    }

    /// Clone of a domain's full state.
    pub async fn state<D: Domain + Clone>(&self) -> Result<D, StoreError> {
        self.read::<D, D, _>(D::clone).await
    }

    /// Serialized state of one domain.
    pub async fn snapshot(&self, domain: &str) -> Result<Value, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StoreCommand::Snapshot { domain: domain.to_string(), reply })
            .map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)?
    }

    /// Count one more invocation of `operation` in flight.
    ///
    /// Synchronous so that paired [`end`](Self::end) calls can run from `Drop`.
    pub fn begin(&self, operation: &str) -> Result<(), StoreError> {
        self.tx.send(StoreCommand::Begin { operation: operation.to_string() })
            .map_err(|_| StoreError::Shutdown)
    }

    /// Count one invocation of `operation` settled.
    pub fn end(&self, operation: &str) -> Result<(), StoreError> {
        self.tx.send(StoreCommand::End { operation: operation.to_string() })
            .map_err(|_| StoreError::Shutdown)
    }

    /// Current in-flight count of `operation`.
    pub async fn in_flight(&self, operation: &str) -> Result<usize, StoreError> {
        let (reply, rx) = oneshot::channel();
        let operation = operation.to_string();
        let f = Box::new(move |store: &Store| {
            let _ = reply.send(Ok(store.in_flight(&operation)));
        });
        self.tx.send(StoreCommand::Read { f }).map_err(|_| StoreError::Shutdown)?;
        rx.await.map_err(|_| StoreError::Shutdown)?
    }

    /// Subscribe to store events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Whether the actor is still running.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

// ============================================================================
// StoreActor (internal)
// ============================================================================

struct StoreActor {
    store: Store,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<StoreCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.handle_command(cmd);
        }
        log::debug!("Store actor shutting down: channel closed");
    }

    fn handle_command(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::Apply { request, reply } => {
                let result = self.store.apply(request);
                self.publish_applied(&result);
                let _ = reply.send(result);
            }
            StoreCommand::Dispatch { action_type, payload, reply } => {
                let result = self.store.dispatch(&action_type, payload);
                if let Err(e) = &result {
                    log::warn!("dispatch {action_type} rejected: {e}");
                }
                self.publish_applied(&result);
                let _ = reply.send(result);
            }
            StoreCommand::Read { f } => f(&self.store),
            StoreCommand::Snapshot { domain, reply } => {
                let _ = reply.send(self.store.snapshot(&domain));
            }
            StoreCommand::Begin { operation } => {
                let in_flight = self.store.begin(&operation);
                let _ = self.events.send(StoreEvent::Pending { operation, in_flight });
            }
            StoreCommand::End { operation } => {
                let in_flight = self.store.end(&operation);
                let _ = self.events.send(StoreEvent::Pending { operation, in_flight });
            }
        }
    }

    fn publish_applied(&self, result: &Result<Applied, StoreError>) {
        if let Ok(Applied::Changed { domain, version }) = result {
            // No receivers is fine.
            let _ = self.events.send(StoreEvent::Changed { domain, version: *version });
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`Store`] and spawns its actor.
pub struct StoreBuilder {
    store: Store,
    event_capacity: usize,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self { store: Store::default(), event_capacity: DEFAULT_EVENT_CAPACITY }
    }

    pub fn ordering(mut self, ordering: MergeOrdering) -> Self {
        self.store.set_ordering(ordering);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Register a domain with its default state.
    pub fn register<D: Domain>(self) -> Self {
        self.register_with(D::default())
    }

    /// Register a domain with an explicit initial state.
    pub fn register_with<D: Domain>(mut self, state: D) -> Self {
        self.store.register(state);
        self
    }

    /// Register every built-in domain.
    pub fn with_builtin_domains(self) -> Self {
        self.register::<Explore>()
            .register::<UserArticle>()
            .register::<Notifications>()
            .register::<Withdraw>()
            .register::<Bank>()
    }

    /// Hydrate registered domains from a server snapshot.
    pub fn hydrate(mut self, snapshot: &Value) -> Result<Self, StoreError> {
        self.store.hydrate(snapshot)?;
        Ok(self)
    }

    /// Take the assembled store without spawning, for synchronous use.
    pub fn into_store(self) -> Store {
        self.store
    }

    /// Spawn the actor on the current tokio runtime.
    pub fn spawn(self) -> StoreHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(self.event_capacity);
        let actor = StoreActor { store: self.store, events: events.clone() };
        tokio::spawn(actor.run(rx));
        StoreHandle { tx, events }
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! Single entry point for `{ type, payload }` actions.
//!
//! A type naming a registered operation runs through the [`ActionRunner`];
//! anything else is applied to the store directly as a reducer action.
//! Operations shadow reducers of the same name (`notifications/readed`).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tayori_store::{Applied, StoreHandle};
use tayori_types::{Envelope, Fields, Keyed};

use crate::operations::{FetchParams, bank, explore, notifications, user_article, withdraw};
use crate::runner::{ActionError, ActionRunner};
use crate::service::{Service, ServiceError};

/// An operation reachable by name.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn invoke(&self, runner: &ActionRunner, service: &dyn Service, payload: Value) -> Result<Envelope<Value>, ActionError>;
}

/// What a dispatched action did.
#[derive(Debug)]
pub enum Outcome {
    /// An operation ran; its envelope, data re-encoded as JSON.
    Ran(Envelope<Value>),
    /// A reducer action was applied.
    Merged(Applied),
}

#[derive(Clone, Copy, Debug)]
enum Builtin {
    Recommends,
    Writer,
    Answerer,
    UserArticles,
    NotificationList,
    NotificationRead,
    WithdrawConfig,
    WithdrawPost,
    BankInfo,
}

impl Builtin {
    const ALL: [(&'static str, Builtin); 9] = [
        (explore::RECOMMENDS, Builtin::Recommends),
        (explore::WRITER, Builtin::Writer),
        (explore::ANSWERER, Builtin::Answerer),
        (user_article::LIST, Builtin::UserArticles),
        (notifications::LIST, Builtin::NotificationList),
        (notifications::READ, Builtin::NotificationRead),
        (withdraw::CONFIG, Builtin::WithdrawConfig),
        (withdraw::POST, Builtin::WithdrawPost),
        (bank::INFO, Builtin::BankInfo),
    ];
}

fn decode<P: DeserializeOwned>(operation: &str, payload: Value) -> Result<P, ActionError> {
    // A missing payload means "no parameters".
    let payload = if payload.is_null() { Value::Object(Fields::new()) } else { payload };
    serde_json::from_value(payload).map_err(|source| ActionError::Payload { operation: operation.to_string(), source })
}

fn encode<D: Serialize>(envelope: Envelope<D>) -> Result<Envelope<Value>, ActionError> {
    envelope
        .try_map(serde_json::to_value)
        .map_err(|e| ActionError::Service(ServiceError::InvalidResponse(e.to_string())))
}

#[async_trait]
impl Operation for Builtin {
    async fn invoke(&self, runner: &ActionRunner, service: &dyn Service, payload: Value) -> Result<Envelope<Value>, ActionError> {
        match self {
            Builtin::Recommends => {
                let params = decode(explore::RECOMMENDS, payload)?;
                encode(explore::recommends(runner, service, params).await?)
            }
            Builtin::Writer => {
                let params = decode(explore::WRITER, payload)?;
                encode(explore::writer(runner, service, params).await?)
            }
            Builtin::Answerer => {
                let params = decode(explore::ANSWERER, payload)?;
                encode(explore::answerer(runner, service, params).await?)
            }
            Builtin::UserArticles => {
                let params = decode(user_article::LIST, payload)?;
                encode(user_article::list(runner, service, params).await?)
            }
            Builtin::NotificationList => {
                let Keyed { key, inner }: Keyed<FetchParams> = decode(notifications::LIST, payload)?;
                encode(notifications::list(runner, service, &key, inner).await?)
            }
            Builtin::NotificationRead => notifications::read(runner, service).await,
            Builtin::WithdrawConfig => encode(withdraw::config(runner, service).await?),
            Builtin::WithdrawPost => {
                let request = decode(withdraw::POST, payload)?;
                withdraw::post(runner, service, request).await
            }
            Builtin::BankInfo => encode(bank::info(runner, service).await?),
        }
    }
}

/// Routes actions to operations or to the store.
#[derive(Clone)]
pub struct Dispatcher {
    runner: ActionRunner,
    service: Arc<dyn Service>,
    operations: HashMap<String, Arc<dyn Operation>>,
}

impl Dispatcher {
    /// A dispatcher with every built-in operation registered.
    pub fn new(runner: ActionRunner, service: Arc<dyn Service>) -> Self {
        let operations = Builtin::ALL
            .into_iter()
            .map(|(name, op)| (name.to_string(), Arc::new(op) as Arc<dyn Operation>))
            .collect();
        Self { runner, service, operations }
    }

    /// Register (or replace) an operation.
    pub fn register(&mut self, name: impl Into<String>, operation: Arc<dyn Operation>) {
        self.operations.insert(name.into(), operation);
    }

    pub fn is_operation(&self, action_type: &str) -> bool {
        self.operations.contains_key(action_type)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub fn store(&self) -> &StoreHandle {
        self.runner.store()
    }

    pub async fn dispatch(&self, action_type: &str, payload: Value) -> Result<Outcome, ActionError> {
        match self.operations.get(action_type) {
            Some(operation) => {
                tracing::debug!(action_type, "dispatching operation");
                let envelope = operation.invoke(&self.runner, self.service.as_ref(), payload).await?;
                Ok(Outcome::Ran(envelope))
            }
            None => Ok(Outcome::Merged(self.runner.store().dispatch(action_type, payload).await?)),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("operations", &self.operations.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Built-in operations: one service call each, merged into one domain.
//!
//! | Operation              | Merge                                   |
//! |------------------------|-----------------------------------------|
//! | `explore/recommends`   | `explore/setRecommends`                 |
//! | `explore/writer`       | `explore/setWriter`                     |
//! | `explore/answerer`     | `explore/setAnswerer`                   |
//! | `userArticle/list`     | `userArticle/setList`                   |
//! | `notifications/list`   | `notifications/setList` (keyed)         |
//! | `notifications/readed` | `notifications/readed`, before the call |
//! | `withdraw/config`      | `withdraw/setConfig`                    |
//! | `withdraw/post`        | none                                    |
//! | `bank/info`            | `bank/setDetail`                        |
//!
//! Paginated fetches take [`FetchParams`]: `append` is a client-side merge
//! flag, stripped before the call and reattached to the fetched page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tayori_store::{Domain, MergeRequest};
use tayori_types::{Envelope, Fields, ListPayload};

use crate::runner::{ActionError, ActionRunner};
use crate::service::{Service, ServiceError};

/// Query for one page of a collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    /// Concatenate the page onto the current collection.
    #[serde(default)]
    pub append: bool,
    /// Sent to the service as-is (cursor, page, filters).
    #[serde(flatten)]
    pub query: Fields,
}

impl FetchParams {
    pub fn first_page() -> Self {
        Self::default()
    }

    pub fn next_page() -> Self {
        Self { append: true, query: Fields::new() }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

/// Call `operation` and decode its data as `T`.
async fn call_typed<T: DeserializeOwned>(
    service: &dyn Service,
    operation: &str,
    payload: Fields,
) -> Result<Envelope<T>, ServiceError> {
    service
        .call(operation, payload)
        .await?
        .try_map(serde_json::from_value)
        .map_err(|e| ServiceError::InvalidResponse(format!("{operation}: {e}")))
}

/// Fetch one page and merge it through `wrap`.
async fn fetch_page<D, T, W>(
    runner: &ActionRunner,
    service: &dyn Service,
    operation: &str,
    params: FetchParams,
    wrap: W,
) -> Result<Envelope<ListPayload<T>>, ActionError>
where
    D: Domain,
    T: DeserializeOwned + Clone,
    W: FnOnce(ListPayload<T>) -> D::Action,
{
    fetch_page_scoped::<D, T, W>(runner, service, operation, operation, params, wrap).await
}

/// [`fetch_page`] for an operation that feeds several lists; `scope` names
/// the list this page lands in.
async fn fetch_page_scoped<D, T, W>(
    runner: &ActionRunner,
    service: &dyn Service,
    operation: &str,
    scope: &str,
    params: FetchParams,
    wrap: W,
) -> Result<Envelope<ListPayload<T>>, ActionError>
where
    D: Domain,
    T: DeserializeOwned + Clone,
    W: FnOnce(ListPayload<T>) -> D::Action,
{
    let FetchParams { append, query } = params;
    let merge = move |envelope: &Envelope<ListPayload<T>>| {
        let mut page = envelope.data().cloned().unwrap_or_default();
        page.append = append;
        Some(MergeRequest::new::<D>(wrap(page)))
    };
    runner.run_scoped(operation, scope, call_typed(service, operation, query), merge).await
}

/// Fetch a scalar and replace the domain value through `wrap`.
async fn fetch_value<D, T, W>(
    runner: &ActionRunner,
    service: &dyn Service,
    operation: &str,
    query: Fields,
    wrap: W,
) -> Result<Envelope<T>, ActionError>
where
    D: Domain,
    T: DeserializeOwned + Clone,
    W: FnOnce(Option<T>) -> D::Action,
{
    runner
        .run(operation, call_typed(service, operation, query), move |envelope: &Envelope<T>| {
            Some(MergeRequest::new::<D>(wrap(envelope.data().cloned())))
        })
        .await
}

pub mod explore {
    use super::*;
    use tayori_store::domains::{Explore, ExploreAction};
    use tayori_types::{FeedItem, UserCard};

    pub const RECOMMENDS: &str = "explore/recommends";
    pub const WRITER: &str = "explore/writer";
    pub const ANSWERER: &str = "explore/answerer";

    pub async fn recommends(
        runner: &ActionRunner,
        service: &dyn Service,
        params: FetchParams,
    ) -> Result<Envelope<ListPayload<FeedItem>>, ActionError> {
        fetch_page::<Explore, _, _>(runner, service, RECOMMENDS, params, |page| {
            ExploreAction::SetRecommends(Some(page))
        })
        .await
    }

    pub async fn writer(
        runner: &ActionRunner,
        service: &dyn Service,
        params: FetchParams,
    ) -> Result<Envelope<ListPayload<UserCard>>, ActionError> {
        fetch_page::<Explore, _, _>(runner, service, WRITER, params, |page| ExploreAction::SetWriter(Some(page))).await
    }

    pub async fn answerer(
        runner: &ActionRunner,
        service: &dyn Service,
        params: FetchParams,
    ) -> Result<Envelope<ListPayload<UserCard>>, ActionError> {
        fetch_page::<Explore, _, _>(runner, service, ANSWERER, params, |page| ExploreAction::SetAnswerer(Some(page)))
            .await
    }
}

pub mod user_article {
    use super::*;
    use tayori_store::domains::{UserArticle, UserArticleAction};
    use tayori_types::ArticleCard;

    pub const LIST: &str = "userArticle/list";

    pub async fn list(
        runner: &ActionRunner,
        service: &dyn Service,
        params: FetchParams,
    ) -> Result<Envelope<ListPayload<ArticleCard>>, ActionError> {
        fetch_page::<UserArticle, _, _>(runner, service, LIST, params, |page| UserArticleAction::SetList(Some(page)))
            .await
    }
}

pub mod notifications {
    use super::*;
    use tayori_store::domains::{Notifications, NotificationsAction};
    use tayori_types::{Keyed, Notification};

    pub const LIST: &str = "notifications/list";
    pub const READ: &str = "notifications/readed";

    /// Fetch one page of the list for `key` (a notification action name).
    pub async fn list(
        runner: &ActionRunner,
        service: &dyn Service,
        key: &str,
        params: FetchParams,
    ) -> Result<Envelope<ListPayload<Notification>>, ActionError> {
        let params = params.with("action", key);
        let scope = format!("{LIST}:{key}");
        let key = key.to_string();
        fetch_page_scoped::<Notifications, _, _>(runner, service, LIST, &scope, params, move |page| {
            NotificationsAction::SetList(Keyed::new(key, page))
        })
        .await
    }

    /// Zero the unread counter locally, then acknowledge the read.
    ///
    /// A failed acknowledgement leaves the local zero in place; the next
    /// push message carries the server's count.
    pub async fn read(runner: &ActionRunner, service: &dyn Service) -> Result<Envelope<Value>, ActionError> {
        runner.store().apply(MergeRequest::new::<Notifications>(NotificationsAction::Readed)).await?;
        runner.run(READ, service.call(READ, Fields::new()), |_| None).await
    }
}

pub mod withdraw {
    use super::*;
    use tayori_store::domains::{Withdraw, WithdrawAction};
    use tayori_types::WithdrawConfig;

    pub const CONFIG: &str = "withdraw/config";
    pub const POST: &str = "withdraw/post";

    pub async fn config(runner: &ActionRunner, service: &dyn Service) -> Result<Envelope<WithdrawConfig>, ActionError> {
        fetch_value::<Withdraw, _, _>(runner, service, CONFIG, Fields::new(), WithdrawAction::SetConfig).await
    }

    /// Submit a withdrawal. The caller reads the envelope; nothing is merged.
    pub async fn post(runner: &ActionRunner, service: &dyn Service, request: Fields) -> Result<Envelope<Value>, ActionError> {
        runner.run(POST, service.call(POST, request), |_| None).await
    }
}

pub mod bank {
    use super::*;
    use tayori_store::domains::{Bank, BankAction};
    use tayori_types::BankDetail;

    pub const INFO: &str = "bank/info";

    pub async fn info(runner: &ActionRunner, service: &dyn Service) -> Result<Envelope<BankDetail>, ActionError> {
        fetch_value::<Bank, _, _>(runner, service, INFO, Fields::new(), BankAction::SetDetail).await
    }
}

// ============================================================================
// Tests
// ============================================================================

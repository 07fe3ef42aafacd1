//! Derived state store.
//!
//! [`Store`] owns every domain's state, the per-operation in-flight counters,
//! and the merge-ordering bookkeeping. It is plain synchronous state; the
//! [`actor`](crate::actor) module puts it behind a single task so all writers
//! are serialized.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Domain, DynDomain, MergeRequest, Slot, split_action_type};
use crate::error::StoreError;

/// How merges from concurrent invocations of one operation are ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeOrdering {
    /// Whichever invocation settles last wins.
    #[default]
    LastSettled,
    /// A ticketed merge older than the last one merged for the same
    /// scope is discarded. Suited to replacing fetches; appending
    /// pagination should stay on `LastSettled`.
    IssueOrder,
}

/// Outcome of applying a merge request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// State changed; the domain is now at `version`.
    Changed { domain: &'static str, version: u64 },
    /// Stale under [`MergeOrdering::IssueOrder`]; nothing changed.
    Discarded { domain: &'static str },
}

struct Entry {
    name: &'static str,
    state: Box<dyn DynDomain>,
    version: u64,
}

/// Process-wide state, keyed by domain name.
pub struct Store {
    domains: IndexMap<&'static str, Entry>,
    pending: HashMap<String, usize>,
    last_merged: HashMap<String, u64>,
    ordering: MergeOrdering,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(MergeOrdering::default())
    }
}

impl Store {
    pub fn new(ordering: MergeOrdering) -> Self {
        Self {
            domains: IndexMap::new(),
            pending: HashMap::new(),
            last_merged: HashMap::new(),
            ordering,
        }
    }

    /// Register a domain with an initial state. Re-registering replaces it.
    pub fn register<D: Domain>(&mut self, state: D) {
        self.domains.insert(D::NAME, Entry { name: D::NAME, state: Box::new(Slot(state)), version: 0 });
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.domains.keys().copied()
    }

    pub fn ordering(&self) -> MergeOrdering {
        self.ordering
    }

    pub fn set_ordering(&mut self, ordering: MergeOrdering) {
        self.ordering = ordering;
    }

    /// Load initial state from a server snapshot `{ "<domain>": {...}, ... }`.
    ///
    /// Keys without a registered domain are ignored; a registered domain whose
    /// snapshot does not fit its state is an error.
    pub fn hydrate(&mut self, snapshot: &Value) -> Result<(), StoreError> {
        let Some(object) = snapshot.as_object() else {
            return Ok(());
        };
        for (name, value) in object {
            match self.domains.get_mut(name.as_str()) {
                Some(entry) => {
                    entry.state.hydrate(value.clone())?;
                    log::debug!("hydrated domain {name}");
                }
                None => log::debug!("snapshot key {name} has no registered domain, skipping"),
            }
        }
        Ok(())
    }

    /// Apply a typed merge request.
    pub fn apply(&mut self, request: MergeRequest) -> Result<Applied, StoreError> {
        let domain = request.domain();

        if let (MergeOrdering::IssueOrder, Some(ticket)) = (self.ordering, request.ticket()) {
            if let Some(&last) = self.last_merged.get(&ticket.scope) {
                if ticket.seq < last {
                    log::debug!(
                        "discarding stale merge for {} (seq {} < {})",
                        ticket.scope, ticket.seq, last
                    );
                    return Ok(Applied::Discarded { domain });
                }
            }
        }
        let ticket = request.ticket().cloned();

        let entry = self
            .domains
            .get_mut(domain)
            .ok_or_else(|| StoreError::UnknownDomain(domain.to_string()))?;
        entry.state.apply_boxed(request.into_action())?;
        entry.version += 1;
        let applied = Applied::Changed { domain: entry.name, version: entry.version };

        if let Some(ticket) = ticket {
            let last = self.last_merged.entry(ticket.scope).or_insert(0);
            *last = (*last).max(ticket.seq);
        }
        Ok(applied)
    }

    /// Apply a wire-form action `{ type: "<domain>/<action>", payload }`.
    pub fn dispatch(&mut self, action_type: &str, payload: Value) -> Result<Applied, StoreError> {
        let (domain, action) = split_action_type(action_type)?;
        let entry = self
            .domains
            .get_mut(domain)
            .ok_or_else(|| StoreError::UnknownDomain(domain.to_string()))?;
        entry.state.apply_wire(action, payload)?;
        entry.version += 1;
        Ok(Applied::Changed { domain: entry.name, version: entry.version })
    }

    /// Borrow a domain's typed state.
    pub fn read<D: Domain>(&self) -> Option<&D> {
        self.domains.get(D::NAME).and_then(|entry| entry.state.as_any().downcast_ref::<D>())
    }

    /// Serialize one domain's state.
    pub fn snapshot(&self, domain: &str) -> Result<Value, StoreError> {
        self.domains
            .get(domain)
            .ok_or_else(|| StoreError::UnknownDomain(domain.to_string()))?
            .state
            .snapshot()
    }

    /// Number of merges applied to a domain since registration.
    pub fn version(&self, domain: &str) -> Option<u64> {
        self.domains.get(domain).map(|entry| entry.version)
    }

    // ── Pending-operation set ───────────────────────────────────────────────

    /// Mark one more invocation of `operation` in flight.
    pub fn begin(&mut self, operation: &str) -> usize {
        let count = self.pending.entry(operation.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Mark one invocation of `operation` settled.
    pub fn end(&mut self, operation: &str) -> usize {
        match self.pending.get_mut(operation) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.pending.remove(operation);
                0
            }
            None => {
                log::warn!("end() for {operation} without matching begin()");
                0
            }
        }
    }

    pub fn in_flight(&self, operation: &str) -> usize {
        self.pending.get(operation).copied().unwrap_or(0)
    }

    pub fn is_loading(&self, operation: &str) -> bool {
        self.in_flight(operation) > 0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ticket;
    use crate::domains::{UserArticle, UserArticleAction};
    use serde_json::json;
    use tayori_types::{ArticleCard, IdPayload, ItemId, ListPayload};

    fn article(id: u64) -> ArticleCard {
        serde_json::from_value(json!({ "id": id, "title": format!("a{id}") })).unwrap()
    }

    fn store() -> Store {
        let mut store = Store::default();
        store.register(UserArticle::default());
        store
    }

    fn ids(store: &Store) -> Vec<ItemId> {
        store.read::<UserArticle>().unwrap().list.ids()
    }

    #[test]
    fn test_typed_apply_bumps_version() {
        let mut store = store();
        let req = MergeRequest::new::<UserArticle>(UserArticleAction::SetList(Some(ListPayload::replace(vec![
            article(1),
            article(2),
        ]))));
        let applied = store.apply(req).unwrap();
        assert_eq!(applied, Applied::Changed { domain: "userArticle", version: 1 });
        assert_eq!(ids(&store), vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn test_wire_dispatch() {
        let mut store = store();
        store
            .dispatch("userArticle/setList", json!({ "list": [{ "id": 1 }, { "id": 2 }] }))
            .unwrap();
        store.dispatch("userArticle/removeItem", json!({ "id": 1 })).unwrap();
        assert_eq!(ids(&store), vec![ItemId(2)]);
        assert_eq!(store.version("userArticle"), Some(2));
    }

    #[test]
    fn test_wire_dispatch_errors() {
        let mut store = store();
        assert!(matches!(store.dispatch("nope/setList", json!({})), Err(StoreError::UnknownDomain(_))));
        assert!(matches!(store.dispatch("userArticle", json!({})), Err(StoreError::MalformedActionType(_))));
        assert!(matches!(
            store.dispatch("userArticle/explode", json!({})),
            Err(StoreError::Decode { .. })
        ));
        assert_eq!(store.version("userArticle"), Some(0));
    }

    #[test]
    fn test_unknown_domain_for_typed_request() {
        let mut store = Store::default();
        let req = MergeRequest::new::<UserArticle>(UserArticleAction::RemoveItem(IdPayload { id: ItemId(1) }));
        assert!(matches!(store.apply(req), Err(StoreError::UnknownDomain(_))));
    }

    #[test]
    fn test_hydrate_from_snapshot() {
        let mut store = store();
        store
            .hydrate(&json!({
                "userArticle": { "list": { "list": [{ "id": 7 }], "more": true } },
                "somethingElse": { "ignored": true },
            }))
            .unwrap();
        assert_eq!(ids(&store), vec![ItemId(7)]);
        assert!(store.read::<UserArticle>().unwrap().list.has_more());

        let err = store.hydrate(&json!({ "userArticle": { "list": 5 } }));
        assert!(matches!(err, Err(StoreError::Hydrate { domain: "userArticle", .. })));
    }

    #[test]
    fn test_hydrated_duplicates_leave_nothing_after_removal() {
        let mut store = store();
        store
            .hydrate(&json!({
                "userArticle": { "list": { "list": [{ "id": 3 }, { "id": 4 }, { "id": 3 }] } },
            }))
            .unwrap();
        assert_eq!(ids(&store), vec![ItemId(3), ItemId(4)]);

        store
            .apply(MergeRequest::new::<UserArticle>(UserArticleAction::RemoveItem(IdPayload { id: ItemId(3) })))
            .unwrap();
        assert_eq!(ids(&store), vec![ItemId(4)]);
    }

    #[test]
    fn test_pending_balance() {
        let mut store = Store::default();
        assert_eq!(store.begin("withdraw/post"), 1);
        assert_eq!(store.begin("withdraw/post"), 2);
        assert!(store.is_loading("withdraw/post"));
        assert_eq!(store.end("withdraw/post"), 1);
        assert_eq!(store.end("withdraw/post"), 0);
        assert!(!store.is_loading("withdraw/post"));
        assert_eq!(store.end("withdraw/post"), 0);
    }

    #[test]
    fn test_last_settled_applies_stale() {
        let mut store = store();
        let newer = MergeRequest::new::<UserArticle>(UserArticleAction::SetList(Some(ListPayload::replace(vec![article(2)]))))
            .with_ticket(Ticket::new("userArticle/list", 2));
        let older = MergeRequest::new::<UserArticle>(UserArticleAction::SetList(Some(ListPayload::replace(vec![article(1)]))))
            .with_ticket(Ticket::new("userArticle/list", 1));
        store.apply(newer).unwrap();
        store.apply(older).unwrap();
        assert_eq!(ids(&store), vec![ItemId(1)]);
    }

    #[test]
    fn test_issue_order_discards_stale() {
        let mut store = Store::new(MergeOrdering::IssueOrder);
        store.register(UserArticle::default());
        let newer = MergeRequest::new::<UserArticle>(UserArticleAction::SetList(Some(ListPayload::replace(vec![article(2)]))))
            .with_ticket(Ticket::new("userArticle/list", 2));
        let older = MergeRequest::new::<UserArticle>(UserArticleAction::SetList(Some(ListPayload::replace(vec![article(1)]))))
            .with_ticket(Ticket::new("userArticle/list", 1));
        store.apply(newer).unwrap();
        assert_eq!(store.apply(older).unwrap(), Applied::Discarded { domain: "userArticle" });
        assert_eq!(ids(&store), vec![ItemId(2)]);
        assert_eq!(store.version("userArticle"), Some(1));
    }

    #[test]
    fn test_issue_order_tracks_scopes_apart() {
        use crate::domains::{Notifications, NotificationsAction};
        use tayori_types::{Keyed, Notification};

        let mut store = Store::new(MergeOrdering::IssueOrder);
        store.register(Notifications::default());
        let page = |key: &str, id: u64| {
            let item: Notification = serde_json::from_value(json!({ "id": id, "action": key })).unwrap();
            NotificationsAction::SetList(Keyed::new(key, ListPayload::replace(vec![item])))
        };

        let default = MergeRequest::new::<Notifications>(page("default", 2))
            .with_ticket(Ticket::new("notifications/list:default", 2));
        let like = MergeRequest::new::<Notifications>(page("like", 1))
            .with_ticket(Ticket::new("notifications/list:like", 1));
        store.apply(default).unwrap();
        assert!(matches!(store.apply(like).unwrap(), Applied::Changed { .. }));

        let n = store.read::<Notifications>().unwrap();
        assert_eq!(n.lists.get("default").unwrap().ids(), vec![ItemId(2)]);
        assert_eq!(n.lists.get("like").unwrap().ids(), vec![ItemId(1)]);
    }
}

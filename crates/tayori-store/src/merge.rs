//! Collection merge engine.
//!
//! Pure functions: a collection and a payload go in, a new collection comes
//! out. No hidden state, no domain knowledge. Every store mutation is one of
//! these applied to a domain's field, which keeps state transitions explicit
//! and replayable.
//!
//! # Invariants
//!
//! - No two items share an identity after any merge.
//! - Order is append order; in-place updates keep position; removal drops
//!   the item and keeps the relative order of the rest.
//! - A missing target (unknown id, no predicate match) is a silent no-op.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tayori_types::{Fields, Identified, ListPayload};

use crate::collection::Collection;

/// Merge a fetched page into a collection.
///
/// - `None` clears the collection (a failed fetch leaves nothing stale behind).
/// - `append = false` replaces items and pagination metadata wholesale.
/// - `append = true` concatenates after the existing items and overwrites only
///   the metadata fields the page carries.
///
/// An incoming item whose identity is already present refreshes that entry in
/// place rather than duplicating it. For a page disjoint from the collection,
/// appending yields exactly `existing ++ page`.
pub fn set_list<T: Identified>(current: Collection<T>, payload: Option<ListPayload<T>>) -> Collection<T> {
    let Some(ListPayload { append, list, meta }) = payload else {
        return Collection::default();
    };

    let (mut items, stored_meta) = if append {
        let (items, mut stored) = current.into_parts();
        stored.merge(meta);
        (items, stored)
    } else {
        (Vec::with_capacity(list.len()), meta)
    };

    let mut index: HashMap<T::Id, usize> =
        items.iter().enumerate().map(|(pos, item)| (item.id(), pos)).collect();

    for item in list {
        match index.get(&item.id()) {
            Some(&pos) => items[pos] = item,
            None => {
                index.insert(item.id(), items.len());
                items.push(item);
            }
        }
    }

    Collection::from_parts(items, stored_meta)
}

/// Drop the item with this identity. Unknown ids leave the collection as is.
pub fn remove_item<T: Identified>(current: Collection<T>, id: &T::Id) -> Collection<T> {
    let (mut items, meta) = current.into_parts();
    if let Some(pos) = items.iter().position(|item| &item.id() == id) {
        items.remove(pos);
    }
    Collection::from_parts(items, meta)
}

/// Replace the first item matching `matches` with `map(item)`, in place.
///
/// This is the only merge that reaches into nested structure: `matches` may
/// look inside a sub-collection of the item and `map` may rebuild it, so a
/// leaf entity addressed by id can be patched inside its parent aggregate.
/// `map` must keep the item's identity.
pub fn replace_item<T, M, F>(current: Collection<T>, matches: M, map: F) -> Collection<T>
where
    M: Fn(&T) -> bool,
    F: FnOnce(&T) -> T,
{
    let (mut items, meta) = current.into_parts();
    if let Some(pos) = items.iter().position(|item| matches(item)) {
        items[pos] = map(&items[pos]);
    }
    Collection::from_parts(items, meta)
}

/// Overlay loosely-typed fields onto a typed item.
///
/// Fails if the item does not serialize to an object or the overlaid fields
/// break its schema.
pub fn try_overlay<T>(item: &T, fields: &Fields) -> serde_json::Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(item)?;
    let serde_json::Value::Object(object) = &mut value else {
        return Err(serde::de::Error::custom("overlay target is not an object"));
    };
    for (key, field) in fields {
        object.insert(key.clone(), field.clone());
    }
    serde_json::from_value(value)
}

/// [`try_overlay`], keeping the item unchanged when the fields do not fit.
pub fn overlay<T>(item: &T, fields: &Fields) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    match try_overlay(item, fields) {
        Ok(merged) => merged,
        Err(e) => {
            log::warn!("overlay skipped, fields do not fit target: {e}");
            item.clone()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;
    use tayori_types::{AnswerCard, ItemId, PageMeta, QuestionCard};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
    }

    impl Identified for Row {
        type Id = u64;

        fn id(&self) -> u64 {
            self.id
        }
    }

    fn row(id: u64, name: &str) -> Row {
        Row { id, name: name.to_string() }
    }

    fn rows(c: &Collection<Row>) -> Vec<(u64, String)> {
        c.iter().map(|r| (r.id, r.name.clone())).collect()
    }

    // =========================================================================
    // set_list
    // =========================================================================

    #[test]
    fn test_append_concatenates_in_order() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b")]);
        let c = set_list(c, Some(ListPayload::append(vec![row(3, "c"), row(4, "d")])));
        assert_eq!(c.ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_replace_discards_prior() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b")]);
        let c = set_list(c, Some(ListPayload::replace(vec![row(9, "z")])));
        assert_eq!(rows(&c), vec![(9, "z".to_string())]);
    }

    #[test]
    fn test_missing_payload_clears() {
        let c = Collection::from_items(vec![row(1, "a")]);
        let c = set_list(c, None);
        assert!(c.is_empty());
        assert_eq!(c.meta(), &PageMeta::default());
    }

    #[test]
    fn test_replace_stores_meta_wholesale() {
        let first = ListPayload::replace(vec![row(1, "a")])
            .with_meta(PageMeta { count: Some(10), cursor: Some("c1".into()), ..Default::default() });
        let c = set_list(Collection::default(), Some(first));
        let second = ListPayload::replace(vec![row(2, "b")])
            .with_meta(PageMeta { count: Some(4), ..Default::default() });
        let c = set_list(c, Some(second));
        assert_eq!(c.meta().count, Some(4));
        assert_eq!(c.meta().cursor, None);
    }

    #[test]
    fn test_append_merges_present_meta_only() {
        let first = ListPayload::replace(vec![row(1, "a")])
            .with_meta(PageMeta { count: Some(10), more: Some(true), ..Default::default() });
        let c = set_list(Collection::default(), Some(first));
        let next = ListPayload::append(vec![row(2, "b")]).with_meta(PageMeta { more: Some(false), ..Default::default() });
        let c = set_list(c, Some(next));
        assert_eq!(c.meta().count, Some(10));
        assert_eq!(c.meta().more, Some(false));
    }

    #[test]
    fn test_overlapping_append_refreshes_in_place() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b")]);
        let c = set_list(c, Some(ListPayload::append(vec![row(2, "b2"), row(3, "c")])));
        assert_eq!(
            rows(&c),
            vec![(1, "a".to_string()), (2, "b2".to_string()), (3, "c".to_string())]
        );
    }

    #[test]
    fn test_replace_with_repeated_ids_is_unique() {
        let c = set_list(Collection::default(), Some(ListPayload::replace(vec![row(1, "a"), row(1, "a2")])));
        assert_eq!(rows(&c), vec![(1, "a2".to_string())]);
    }

    // =========================================================================
    // remove_item
    // =========================================================================

    #[test]
    fn test_remove_keeps_relative_order() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b"), row(3, "c")]);
        let c = remove_item(c, &2);
        assert_eq!(c.ids(), vec![1, 3]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b")]);
        let once = remove_item(c.clone(), &1);
        let twice = remove_item(once.clone(), &1);
        assert_eq!(once, twice);
        assert_eq!(remove_item(c.clone(), &99), c);
    }

    #[test]
    fn test_remove_then_append_example() {
        let c = Collection::from_items(vec![row(1, "a"), row(2, "b")]);
        let c = remove_item(c, &1);
        assert_eq!(rows(&c), vec![(2, "b".to_string())]);
        let c = set_list(c, Some(ListPayload::append(vec![row(3, "c")])));
        assert_eq!(rows(&c), vec![(2, "b".to_string()), (3, "c".to_string())]);
    }

    // =========================================================================
    // replace_item
    // =========================================================================

    #[test]
    fn test_replace_first_match_only() {
        let c = Collection::from_items(vec![row(1, "x"), row(2, "x")]);
        let c = replace_item(c, |r| r.name == "x", |r| row(r.id, "y"));
        assert_eq!(rows(&c), vec![(1, "y".to_string()), (2, "x".to_string())]);
    }

    #[test]
    fn test_replace_no_match_is_noop() {
        let c = Collection::from_items(vec![row(1, "a")]);
        let out = replace_item(c.clone(), |r| r.id == 5, |_| panic!("map must not run"));
        assert_eq!(out, c);
    }

    #[test]
    fn test_nested_replace_touches_only_target() {
        let question = |id: u64, answers: Vec<AnswerCard>| QuestionCard {
            id: ItemId(id),
            title: format!("q{id}"),
            answer_list: answers,
            extra: Fields::new(),
        };
        let answer = |id: u64, text: &str| AnswerCard {
            id: ItemId(id),
            extra: json!({ "content": text }).as_object().cloned().unwrap(),
        };

        let c = Collection::from_items(vec![
            question(1, vec![answer(10, "a"), answer(11, "b")]),
            question(2, vec![answer(20, "c")]),
        ]);
        let before = c.clone();
        let fields = json!({ "content": "b2" }).as_object().cloned().unwrap();
        let target = ItemId(11);

        let c = replace_item(
            c,
            |q| q.answer(target).is_some(),
            |q| {
                let mut q = q.clone();
                q.answer_list = q
                    .answer_list
                    .iter()
                    .map(|a| if a.id == target { overlay(a, &fields) } else { a.clone() })
                    .collect();
                q
            },
        );

        assert_eq!(c.items()[1], before.items()[1]);
        assert_eq!(c.items()[0].answer_list[0], before.items()[0].answer_list[0]);
        assert_eq!(c.items()[0].answer_list[1].extra.get("content"), Some(&json!("b2")));
        assert_eq!(c.items()[0].title, "q1");
    }

    // =========================================================================
    // overlay
    // =========================================================================

    #[test]
    fn test_overlay_sets_fields() {
        let fields = json!({ "name": "renamed" }).as_object().cloned().unwrap();
        assert_eq!(overlay(&row(1, "a"), &fields), row(1, "renamed"));
    }

    #[test]
    fn test_overlay_mismatch_keeps_item() {
        let fields = json!({ "name": 42 }).as_object().cloned().unwrap();
        assert!(try_overlay(&row(1, "a"), &fields).is_err());
        assert_eq!(overlay(&row(1, "a"), &fields), row(1, "a"));
    }

    // =========================================================================
    // Properties
    // =========================================================================

    #[derive(Clone, Debug)]
    enum Op {
        Append(Vec<u64>),
        Replace(Vec<u64>),
        Remove(u64),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let ids = proptest::collection::vec(0u64..12, 0..6);
        prop_oneof![
            ids.clone().prop_map(Op::Append),
            ids.prop_map(Op::Replace),
            (0u64..12).prop_map(Op::Remove),
            Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn prop_identity_stays_unique(ops in proptest::collection::vec(op_strategy(), 0..24)) {
            let mut c: Collection<Row> = Collection::default();
            for op in ops {
                c = match op {
                    Op::Append(ids) => set_list(c, Some(ListPayload::append(ids.into_iter().map(|i| row(i, "p")).collect()))),
                    Op::Replace(ids) => set_list(c, Some(ListPayload::replace(ids.into_iter().map(|i| row(i, "p")).collect()))),
                    Op::Remove(id) => remove_item(c, &id),
                    Op::Clear => set_list(c, None),
                };
                let mut ids = c.ids();
                let len = ids.len();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), len);
            }
        }

        #[test]
        fn prop_disjoint_append_is_concatenation(n in 0u64..8, m in 0u64..8) {
            let l1: Vec<Row> = (0..n).map(|i| row(i, "l1")).collect();
            let l2: Vec<Row> = (100..100 + m).map(|i| row(i, "l2")).collect();
            let c = set_list(Collection::from_items(l1.clone()), Some(ListPayload::append(l2.clone())));
            let expected: Vec<Row> = l1.into_iter().chain(l2).collect();
            prop_assert_eq!(c.items(), expected.as_slice());
        }
    }
}

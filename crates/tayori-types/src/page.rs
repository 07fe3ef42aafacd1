//! Page and merge payloads.
//!
//! These are the payload shapes of merge requests: a fetched page
//! ([`ListPayload`]), a removal ([`IdPayload`]), a leaf update ([`Patch`]),
//! and [`Keyed`] for domains holding several named collections.

use serde::{Deserialize, Serialize};

use crate::Fields;
use crate::ids::ItemId;

/// Pagination metadata stored alongside a collection.
///
/// Every field is optional; an absent field means "no change" when merged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl PageMeta {
    /// Overwrite the fields present in `other`.
    pub fn merge(&mut self, other: PageMeta) {
        if other.count.is_some() {
            self.count = other.count;
        }
        if other.more.is_some() {
            self.more = other.more;
        }
        if other.cursor.is_some() {
            self.cursor = other.cursor;
        }
        if other.page.is_some() {
            self.page = other.page;
        }
    }
}

/// One page of items, as returned in an envelope's `data`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListPayload<T> {
    /// Concatenate onto the existing collection instead of replacing it.
    #[serde(default)]
    pub append: bool,
    #[serde(default = "Vec::new")]
    pub list: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> ListPayload<T> {
    pub fn replace(list: Vec<T>) -> Self {
        Self { append: false, list, meta: PageMeta::default() }
    }

    pub fn append(list: Vec<T>) -> Self {
        Self { append: true, list, meta: PageMeta::default() }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl<T> Default for ListPayload<T> {
    fn default() -> Self {
        Self::replace(Vec::new())
    }
}

/// Payload of a removal: the identity to drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPayload {
    pub id: ItemId,
}

/// Update event for one leaf entity.
///
/// Servers identify the entity by id; everything else is a field to overlay
/// onto the local copy. Fields the patch omits stay as they are.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: ItemId,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Patch {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self { id: id.into(), fields: Fields::new() }
    }

    /// Builder-style field setter.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A payload addressed to one named collection of a domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyed<P> {
    pub key: String,
    #[serde(flatten)]
    pub inner: P,
}

impl<P> Keyed<P> {
    pub fn new(key: impl Into<String>, inner: P) -> Self {
        Self { key: key.into(), inner }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_merge_keeps_absent_fields() {
        let mut meta = PageMeta { count: Some(10), more: Some(true), cursor: Some("a".into()), page: Some(1) };
        meta.merge(PageMeta { more: Some(false), ..Default::default() });
        assert_eq!(meta.count, Some(10));
        assert_eq!(meta.more, Some(false));
        assert_eq!(meta.cursor.as_deref(), Some("a"));
        assert_eq!(meta.page, Some(1));
    }

    #[test]
    fn test_list_payload_defaults() {
        let p: ListPayload<u32> = serde_json::from_value(json!({ "count": 3 })).unwrap();
        assert!(!p.append);
        assert!(p.list.is_empty());
        assert_eq!(p.meta.count, Some(3));
    }

    #[test]
    fn test_list_payload_of_cards() {
        use crate::content::ArticleCard;

        let p: ListPayload<ArticleCard> =
            serde_json::from_value(json!({ "list": [{ "id": 1, "title": "t" }], "more": true })).unwrap();
        assert_eq!(p.list.len(), 1);
        assert_eq!(p.list[0].title, "t");
        assert_eq!(p.meta.more, Some(true));

        let empty: ListPayload<ArticleCard> = serde_json::from_value(json!({ "more": false })).unwrap();
        assert!(empty.list.is_empty());
    }

    #[test]
    fn test_patch_collects_fields() {
        let p: Patch = serde_json::from_value(json!({ "id": 9, "vote": 3, "title": "x" })).unwrap();
        assert_eq!(p.id, ItemId(9));
        assert_eq!(p.fields.len(), 2);
        assert!(!p.fields.contains_key("id"));
    }

    #[test]
    fn test_keyed_flattens_inner() {
        let k: Keyed<ListPayload<u32>> =
            serde_json::from_value(json!({ "key": "like", "append": true, "list": [1, 2], "more": true })).unwrap();
        assert_eq!(k.key, "like");
        assert!(k.inner.append);
        assert_eq!(k.inner.list, vec![1, 2]);
        assert_eq!(k.inner.meta.more, Some(true));
    }
}

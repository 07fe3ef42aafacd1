//! Identity-keyed ordered collections.
//!
//! A [`Collection`] serializes as `{ "list": [...], "count"?, "more"?, ... }`,
//! the same shape servers embed in the initial page snapshot, so domains
//! hydrate without a translation step. [`Collections`] holds several named
//! collections for domains that page more than one list.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tayori_types::{Identified, ListPayload, PageMeta};

use crate::merge;

/// Ordered items plus the pagination metadata of the last merged page.
///
/// Deserializing goes through [`merge::set_list`], so a snapshot that repeats
/// an identity hydrates with one entry per id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
    #[serde(flatten)]
    meta: PageMeta,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { list: Vec::new(), meta: PageMeta::default() }
    }
}

impl<'de, T> Deserialize<'de> for Collection<T>
where
    T: Identified + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let page = ListPayload::<T>::deserialize(deserializer)?;
        Ok(merge::set_list(Collection::default(), Some(ListPayload { append: false, ..page })))
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from items without checking identity. Use [`merge::set_list`]
    /// when the input may repeat identities.
    pub fn from_items(list: Vec<T>) -> Self {
        Self { list, meta: PageMeta::default() }
    }

    pub(crate) fn from_parts(list: Vec<T>, meta: PageMeta) -> Self {
        Self { list, meta }
    }

    pub fn into_parts(self) -> (Vec<T>, PageMeta) {
        (self.list, self.meta)
    }

    pub fn items(&self) -> &[T] {
        &self.list
    }

    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.list.iter()
    }

    /// Whether the server reported more pages after this one.
    pub fn has_more(&self) -> bool {
        self.meta.more.unwrap_or(false)
    }
}

impl<T: Identified> Collection<T> {
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.list.iter().find(|item| &item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.list.iter().map(Identified::id).collect()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

/// Named collections of one item type, in first-use order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent, bound(deserialize = "T: Identified + Deserialize<'de>"))]
pub struct Collections<T> {
    inner: IndexMap<String, Collection<T>>,
}

impl<T> Default for Collections<T> {
    fn default() -> Self {
        Self { inner: IndexMap::new() }
    }
}

impl<T> Collections<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Collection<T>> {
        self.inner.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Identified> Collections<T> {
    /// [`merge::set_list`] on the named collection, creating it if needed.
    pub fn set_list(mut self, key: &str, payload: Option<ListPayload<T>>) -> Self {
        let slot = self.inner.entry(key.to_string()).or_default();
        *slot = merge::set_list(std::mem::take(slot), payload);
        self
    }

    /// [`merge::remove_item`] on the named collection; no-op for unknown keys.
    pub fn remove_item(mut self, key: &str, id: &T::Id) -> Self {
        if let Some(slot) = self.inner.get_mut(key) {
            *slot = merge::remove_item(std::mem::take(slot), id);
        }
        self
    }

    /// [`merge::replace_item`] on the named collection; no-op for unknown keys.
    pub fn replace_item<M, F>(mut self, key: &str, matches: M, map: F) -> Self
    where
        M: Fn(&T) -> bool,
        F: FnOnce(&T) -> T,
    {
        if let Some(slot) = self.inner.get_mut(key) {
            *slot = merge::replace_item(std::mem::take(slot), matches, map);
        }
        self
    }
}

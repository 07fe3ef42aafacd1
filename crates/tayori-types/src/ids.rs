//! Entity identity.
//!
//! Server entities carry an integer `id` that is stable across fetches and
//! updates. Collections key on it; [`Identified`] lets the merge engine stay
//! generic over item types whose identity is richer than a bare id (a feed
//! entry is only unique per kind).

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Integer identity assigned by the server.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An item with a stable identity.
///
/// No two items in a collection share an identity after any merge.
pub trait Identified {
    type Id: Eq + Hash + Clone + fmt::Debug;

    fn id(&self) -> Self::Id;
}

// ============================================================================
// Tests
// ============================================================================

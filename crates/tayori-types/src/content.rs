//! Content payloads: articles, questions, answers, feed entries, users,
//! notifications.
//!
//! Only the fields the client keys or nests on are typed. Everything else
//! rides in a flattened `extra` map so payloads pass through unchanged.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;
use strum::EnumString;

use crate::Fields;
use crate::ids::{Identified, ItemId};

/// A tag attached to an article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
}

/// Author / writer / answerer summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserCard {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArticleCard {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerCard {
    pub id: ItemId,
    #[serde(flatten)]
    pub extra: Fields,
}

/// A question with the answers shown under it in a feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionCard {
    pub id: ItemId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub answer_list: Vec<AnswerCard>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl QuestionCard {
    pub fn answer(&self, id: ItemId) -> Option<&AnswerCard> {
        self.answer_list.iter().find(|a| a.id == id)
    }
}

/// Feed entry kind. Ids are only unique within a kind.
///
/// Kinds this client does not model parse to [`FeedKind::Other`] with the
/// wire name kept.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FeedKind {
    Article,
    Question,
    #[strum(default)]
    Other(String),
}

impl FeedKind {
    pub fn as_str(&self) -> &str {
        match self {
            FeedKind::Article => "article",
            FeedKind::Question => "question",
            FeedKind::Other(name) => name,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object of a feed entry whose kind is not modelled. Only the id is read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OtherCard {
    pub id: ItemId,
    #[serde(flatten)]
    pub extra: Fields,
}

/// One entry of a recommendation feed: `{ "type": ..., "object": {...} }`.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedItem {
    Article(ArticleCard),
    Question(QuestionCard),
    /// Any other `type`, carried through untouched.
    Other { kind: String, object: OtherCard },
}

#[derive(Serialize, Deserialize)]
struct FeedWire<K, O> {
    #[serde(rename = "type")]
    kind: K,
    object: O,
}

impl Serialize for FeedItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedItem::Article(object) => FeedWire { kind: "article", object }.serialize(serializer),
            FeedItem::Question(object) => FeedWire { kind: "question", object }.serialize(serializer),
            FeedItem::Other { kind, object } => FeedWire { kind: kind.as_str(), object }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let FeedWire { kind, object } = FeedWire::<String, Value>::deserialize(deserializer)?;
        let item = match kind.parse::<FeedKind>() {
            Ok(FeedKind::Article) => serde_json::from_value(object).map(FeedItem::Article),
            Ok(FeedKind::Question) => serde_json::from_value(object).map(FeedItem::Question),
            _ => serde_json::from_value(object).map(|object| FeedItem::Other { kind, object }),
        };
        item.map_err(de::Error::custom)
    }
}

impl FeedItem {
    pub fn kind(&self) -> FeedKind {
        match self {
            FeedItem::Article(_) => FeedKind::Article,
            FeedItem::Question(_) => FeedKind::Question,
            FeedItem::Other { kind, .. } => FeedKind::Other(kind.clone()),
        }
    }

    pub fn object_id(&self) -> ItemId {
        match self {
            FeedItem::Article(a) => a.id,
            FeedItem::Question(q) => q.id,
            FeedItem::Other { object, .. } => object.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

// ── Identity ────────────────────────────────────────────────────────────────

macro_rules! impl_identified_by_id {
    ($($T:ty),* $(,)?) => {
        $(
            impl Identified for $T {
                type Id = ItemId;

                fn id(&self) -> ItemId {
                    self.id
                }
            }
        )*
    };
}

impl_identified_by_id!(Tag, UserCard, ArticleCard, AnswerCard, QuestionCard, Notification);

impl Identified for FeedItem {
    type Id = (FeedKind, ItemId);

    fn id(&self) -> Self::Id {
        (self.kind(), self.object_id())
    }
}

// ============================================================================
// Tests
// ============================================================================

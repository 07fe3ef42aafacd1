//! Shared envelope, page, and payload types for Tayori.
//!
//! This crate is the wire foundation: response envelopes, pagination
//! metadata, identity, push-channel messages, and the content payloads the
//! store carries. It has **no internal tayori dependencies**, a pure leaf
//! crate that the store and client build on.
//!
//! # Key Types
//!
//! |----------------------|---------------------------------------------------|
//! | Type                 | Purpose                                           |
//! |----------------------|---------------------------------------------------|
//! | [`Envelope`]         | Service response: success flag + data + message   |
//! | [`ListPayload`]      | One fetched page, with `append` and [`PageMeta`]  |
//! | [`Patch`]            | Leaf-entity update: id + fields to overlay        |
//! | [`Identified`]       | Stable identity used by every collection merge    |
//! | [`PushMessage`]      | Inbound realtime counter message                  |
//! | [`ClientMessage`]    | Outbound realtime messages (readiness handshake)  |
//! |----------------------|---------------------------------------------------|

pub mod content;
pub mod envelope;
pub mod ids;
pub mod page;
pub mod push;
pub mod wallet;

pub use content::{AnswerCard, ArticleCard, FeedItem, FeedKind, Notification, OtherCard, QuestionCard, Tag, UserCard};
pub use envelope::Envelope;
pub use ids::{Identified, ItemId};
pub use page::{IdPayload, Keyed, ListPayload, PageMeta, Patch};
pub use push::{ClientMessage, GroupCount, PushMessage};
pub use wallet::{BankDetail, WithdrawConfig};

/// Free-form JSON object, used for pass-through fields the client never interprets.
pub type Fields = serde_json::Map<String, serde_json::Value>;

//! Built-in domains.
//!
//! Each mirrors one model of the web client: its state shape matches the
//! server snapshot for that page, and its actions are the named merges the
//! UI and the action runner dispatch.

mod explore;
mod notifications;
mod user_article;
mod wallet;

pub use explore::{Explore, ExploreAction};
pub use notifications::{Notifications, NotificationsAction};
pub use user_article::{UserArticle, UserArticleAction};
pub use wallet::{Bank, BankAction, Withdraw, WithdrawAction};

//! A user's own article list (dashboard).

use serde::{Deserialize, Serialize};
use tayori_types::{ArticleCard, IdPayload, ListPayload};

use crate::collection::Collection;
use crate::domain::Domain;
use crate::merge;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserArticle {
    #[serde(default)]
    pub list: Collection<ArticleCard>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum UserArticleAction {
    SetList(Option<ListPayload<ArticleCard>>),
    RemoveItem(IdPayload),
}

impl Domain for UserArticle {
    const NAME: &'static str = "userArticle";

    type Action = UserArticleAction;

    fn reduce(mut self, action: UserArticleAction) -> Self {
        self.list = match action {
            UserArticleAction::SetList(payload) => merge::set_list(self.list, payload),
            UserArticleAction::RemoveItem(IdPayload { id }) => merge::remove_item(self.list, &id),
        };
        self
    }
}

//! Explore page: recommendation feed, writer and answerer rankings.

use serde::{Deserialize, Serialize};
use tayori_types::{FeedItem, Fields, ListPayload, Patch, QuestionCard, UserCard};

use crate::collection::Collection;
use crate::domain::Domain;
use crate::merge;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Explore {
    #[serde(default)]
    pub recommends: Collection<FeedItem>,
    #[serde(default)]
    pub writer: Collection<UserCard>,
    #[serde(default)]
    pub answerer: Collection<UserCard>,
    /// Other page data from the snapshot, kept verbatim.
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ExploreAction {
    SetRecommends(Option<ListPayload<FeedItem>>),
    SetWriter(Option<ListPayload<UserCard>>),
    SetAnswerer(Option<ListPayload<UserCard>>),
    /// Patch an article entry of the feed.
    ReplaceRecommendsArticle(Patch),
    /// Patch one answer inside the question entry that lists it.
    ReplaceRecommendsAnswer(Patch),
}

impl Domain for Explore {
    const NAME: &'static str = "explore";

    type Action = ExploreAction;

    fn reduce(mut self, action: ExploreAction) -> Self {
        match action {
            ExploreAction::SetRecommends(payload) => {
                self.recommends = merge::set_list(std::mem::take(&mut self.recommends), payload);
            }
            ExploreAction::SetWriter(payload) => {
                self.writer = merge::set_list(std::mem::take(&mut self.writer), payload);
            }
            ExploreAction::SetAnswerer(payload) => {
                self.answerer = merge::set_list(std::mem::take(&mut self.answerer), payload);
            }
            ExploreAction::ReplaceRecommendsArticle(patch) => {
                self.recommends = merge::replace_item(
                    std::mem::take(&mut self.recommends),
                    |item| matches!(item, FeedItem::Article(a) if a.id == patch.id),
                    |item| match item {
                        FeedItem::Article(a) => FeedItem::Article(merge::overlay(a, &patch.fields)),
                        other => other.clone(),
                    },
                );
            }
            ExploreAction::ReplaceRecommendsAnswer(patch) => {
                self.recommends = merge::replace_item(
                    std::mem::take(&mut self.recommends),
                    |item| matches!(item, FeedItem::Question(q) if q.answer(patch.id).is_some()),
                    |item| match item {
                        FeedItem::Question(q) => FeedItem::Question(patch_answer(q, &patch)),
                        other => other.clone(),
                    },
                );
            }
        }
        self
    }
}

/// Overlay the patch onto the matching answer, then the remaining fields onto
/// the question itself. The question keeps its own id and answer list.
fn patch_answer(question: &QuestionCard, patch: &Patch) -> QuestionCard {
    let answer_list = question
        .answer_list
        .iter()
        .map(|answer| {
            if answer.id == patch.id {
                merge::overlay(answer, &patch.fields)
            } else {
                answer.clone()
            }
        })
        .collect();

    let mut parent_fields = patch.fields.clone();
    parent_fields.remove("answer_list");
    let mut parent = merge::overlay(question, &parent_fields);
    parent.answer_list = answer_list;
    parent
}

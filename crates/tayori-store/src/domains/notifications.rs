//! Notifications: per-action lists plus the realtime unread counter.
//!
//! `groupCount` is owned by the push channel: every inbound message replaces
//! it wholesale through `setGroupCount`. `readed` zeroes it locally as soon as
//! the popover is seen, ahead of the server acknowledging the read.

use serde::{Deserialize, Serialize};
use tayori_types::{GroupCount, IdPayload, Keyed, ListPayload, Notification, Patch};

use crate::collection::Collections;
use crate::domain::Domain;
use crate::merge;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    /// Lists keyed by notification action ("default", "like", "follow", …).
    #[serde(default)]
    pub lists: Collections<Notification>,
    #[serde(default)]
    pub group_count: GroupCount,
    /// Whether the current unread counter has been seen.
    #[serde(default)]
    pub readed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum NotificationsAction {
    SetList(Keyed<ListPayload<Notification>>),
    RemoveItem(Keyed<IdPayload>),
    ReplaceItem(Keyed<Patch>),
    SetGroupCount(GroupCount),
    Readed,
}

impl Domain for Notifications {
    const NAME: &'static str = "notifications";

    type Action = NotificationsAction;

    fn reduce(mut self, action: NotificationsAction) -> Self {
        match action {
            NotificationsAction::SetList(Keyed { key, inner }) => {
                self.lists = self.lists.set_list(&key, Some(inner));
            }
            NotificationsAction::RemoveItem(Keyed { key, inner }) => {
                self.lists = self.lists.remove_item(&key, &inner.id);
            }
            NotificationsAction::ReplaceItem(Keyed { key, inner: patch }) => {
                self.lists = self.lists.replace_item(
                    &key,
                    |n| n.id == patch.id,
                    |n| merge::overlay(n, &patch.fields),
                );
            }
            NotificationsAction::SetGroupCount(group_count) => {
                if group_count.has_unread() {
                    self.readed = false;
                }
                self.group_count = group_count;
            }
            NotificationsAction::Readed => {
                self.group_count.count = 0;
                self.readed = true;
            }
        }
        self
    }
}

impl Notifications {
    /// Unread count, with non-positive server values read as none.
    pub fn unread(&self) -> u64 {
        u64::try_from(self.group_count.count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tayori_types::ItemId;

    fn reduce_wire(state: Notifications, action: serde_json::Value) -> Notifications {
        state.reduce(serde_json::from_value(action).unwrap())
    }

    #[test]
    fn test_set_group_count_replaces_wholesale() {
        let n = Notifications::default()
            .reduce(NotificationsAction::SetGroupCount(GroupCount::new(4, "like")))
            .reduce(NotificationsAction::SetGroupCount(GroupCount::new(1, "follow")));
        assert_eq!(n.group_count, GroupCount::new(1, "follow"));
        assert!(!n.readed);
    }

    #[test]
    fn test_readed_zeroes_locally() {
        let n = Notifications::default()
            .reduce(NotificationsAction::SetGroupCount(GroupCount::new(4, "like")))
            .reduce(NotificationsAction::Readed);
        assert_eq!(n.unread(), 0);
        assert_eq!(n.group_count.group, "like");
        assert!(n.readed);

        let n = n.reduce(NotificationsAction::SetGroupCount(GroupCount::new(2, "like")));
        assert!(!n.readed);
    }

    #[test]
    fn test_wire_actions() {
        let n = reduce_wire(
            Notifications::default(),
            json!({ "type": "setList", "payload": { "key": "like", "list": [{ "id": 1 }, { "id": 2 }] } }),
        );
        let n = reduce_wire(n, json!({ "type": "removeItem", "payload": { "key": "like", "id": 1 } }));
        let n = reduce_wire(
            n,
            json!({ "type": "replaceItem", "payload": { "key": "like", "id": 2, "is_read": true } }),
        );
        let n = reduce_wire(n, json!({ "type": "readed", "payload": null }));

        let like = n.lists.get("like").unwrap();
        assert_eq!(like.ids(), vec![ItemId(2)]);
        assert_eq!(like.items()[0].extra.get("is_read"), Some(&json!(true)));
        assert!(n.readed);
    }

    #[test]
    fn test_remove_from_unknown_list_is_noop() {
        let n = Notifications::default()
            .reduce(NotificationsAction::RemoveItem(Keyed::new("default", IdPayload { id: ItemId(1) })));
        assert!(n.lists.is_empty());
    }
}

//! The updates feed: five independently-fetched sources merged into one
//! time-ordered list of tagged items.

use anyhow::Result;
use chrono::Utc;

use super::{ActivityService, ChatService, FriendService};
use crate::models::{UpdateItem, UpdatePayload};
use crate::store::Store;

#[derive(Clone)]
pub struct UpdateService<S> {
    activities: ActivityService<S>,
    friends: FriendService<S>,
    chats: ChatService<S>,
}

impl<S: Store> UpdateService<S> {
    pub fn new(
        activities: ActivityService<S>,
        friends: FriendService<S>,
        chats: ChatService<S>,
    ) -> Self {
        Self {
            activities,
            friends,
            chats,
        }
    }

    /// Fetches all five sources concurrently and merges them, most recent
    /// first. Items carry stable synthetic ids so a refreshed list can be
    /// diffed against the previous one.
    pub async fn refresh(&self) -> Result<Vec<UpdateItem>> {
        let (requests, unread, upcoming, popular, confirmable) = tokio::join!(
            self.friends.pending_requests(),
            self.chats.unread_summary(),
            self.activities.upcoming_liked(),
            self.activities.popular_liked(),
            self.activities.awaiting_confirmation(),
        );
        let (requests, unread, upcoming, popular, confirmable) =
            (requests?, unread?, upcoming?, popular?, confirmable?);

        let mut items = Vec::new();

        for request in requests {
            let sender_name = request
                .sender
                .as_ref()
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|| "Someone".to_string());
            items.push(UpdateItem::new(
                UpdatePayload::FriendRequest {
                    friendship_id: request.friendship.id,
                    sender_id: request.friendship.user_id_1,
                },
                format!("{sender_name} sent you a friend request"),
                request.friendship.created_at,
            ));
        }

        for room in unread {
            let latest = self.chats.latest_message(room.room_id).await?;
            let timestamp = latest.map(|m| m.created_at).unwrap_or_else(Utc::now);
            let plural = if room.unread == 1 { "" } else { "s" };
            items.push(UpdateItem::new(
                UpdatePayload::UnreadMessages {
                    room_id: room.room_id,
                    unread: room.unread,
                },
                format!("{} new message{plural}", room.unread),
                timestamp,
            ));
        }

        for activity in upcoming {
            items.push(UpdateItem::new(
                UpdatePayload::ActivityReminder {
                    activity_id: activity.id,
                },
                format!("{} is starting soon", activity.name),
                activity.activity_date,
            ));
        }

        for (activity, likes) in popular {
            items.push(UpdateItem::new(
                UpdatePayload::ActivityPopular {
                    activity_id: activity.id,
                    likes,
                },
                format!("{} has enough people to happen", activity.name),
                activity.created_at,
            ));
        }

        for activity in confirmable {
            items.push(UpdateItem::new(
                UpdatePayload::ConfirmationNeeded {
                    activity_id: activity.id,
                },
                format!("Confirm your spot for {}", activity.name),
                activity.created_at,
            ));
        }

        Ok(order_feed(items))
    }
}

/// Descending by timestamp. The sort is stable, so equal timestamps keep
/// the category insertion order: requests, messages, reminders, popular,
/// confirmations.
fn order_feed(mut items: Vec<UpdateItem>) -> Vec<UpdateItem> {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityDraft;
    use crate::session::Session;
    use crate::store::MemStore;
    use chrono::Duration;
    use std::sync::Arc;
    use uuid::Uuid;

    fn build(store: &Arc<MemStore>, user: Uuid) -> UpdateService<MemStore> {
        let session = Session::signed_in(user);
        UpdateService::new(
            ActivityService::new(store.clone(), session.clone()),
            FriendService::new(store.clone(), session.clone()),
            ChatService::new(store.clone(), session),
        )
    }

    fn draft(hours_ahead: i64) -> ActivityDraft {
        ActivityDraft {
            name: "Open-Air Concert".to_string(),
            description: "Live bands".to_string(),
            location: None,
            activity_date: Utc::now() + Duration::hours(hours_ahead),
            min_participants: 2,
            max_participants: 40,
            creator_id: Uuid::new_v4(),
            interest_id: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn newer_popular_item_sorts_before_older_friend_request() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        // The request lands first, then the activity reaches quorum.
        store.insert_friendship(bob.id, alice.id).await.unwrap();
        let activity = store.insert_activity(&draft(100)).await.unwrap();
        store.insert_swipe(alice.id, activity.id, true).await.unwrap();
        store.insert_swipe(bob.id, activity.id, true).await.unwrap();

        let feed = build(&store, alice.id).refresh().await.unwrap();
        let kinds: Vec<&str> = feed.iter().map(|i| i.payload.kind()).collect();

        let popular_pos = kinds.iter().position(|k| *k == "activity_popular").unwrap();
        let request_pos = kinds.iter().position(|k| *k == "friend_request").unwrap();
        assert!(popular_pos < request_pos);
    }

    #[tokio::test]
    async fn synthetic_ids_are_stable_across_refreshes() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;
        store.insert_friendship(bob.id, alice.id).await.unwrap();

        let service = build(&store, alice.id);
        let first = service.refresh().await.unwrap();
        let second = service.refresh().await.unwrap();

        let first_ids: Vec<&str> = first.iter().map(|i| i.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
        assert!(first_ids[0].starts_with("friend_request:"));
    }

    #[tokio::test]
    async fn unread_items_take_the_latest_message_timestamp() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let session = Session::signed_in(alice.id);
        let chats = ChatService::new(store.clone(), session);
        let room = chats.start_direct_chat(bob.id).await.unwrap();
        let message = store.insert_message(room, bob.id, "hello").await.unwrap();
        let old = Utc::now() - Duration::hours(5);
        store.backdate_message(message.id, old).await;

        let feed = build(&store, alice.id).refresh().await.unwrap();
        let item = feed
            .iter()
            .find(|i| i.payload.kind() == "unread_messages")
            .unwrap();
        assert_eq!(item.timestamp, old);
        assert_eq!(item.message, "1 new message");
    }

    #[test]
    fn equal_timestamps_keep_category_insertion_order() {
        let now = Utc::now();
        let room = Uuid::new_v4();
        let activity = Uuid::new_v4();
        let request = UpdateItem::new(
            UpdatePayload::FriendRequest {
                friendship_id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
            },
            "request".to_string(),
            now,
        );
        let unread = UpdateItem::new(
            UpdatePayload::UnreadMessages { room_id: room, unread: 2 },
            "messages".to_string(),
            now,
        );
        let popular = UpdateItem::new(
            UpdatePayload::ActivityPopular { activity_id: activity, likes: 4 },
            "popular".to_string(),
            now,
        );

        let ordered = order_feed(vec![request.clone(), unread.clone(), popular.clone()]);
        assert_eq!(ordered, vec![request, unread, popular]);
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Activity, ActivityDraft, ActivityStatus, ChatRoom, FriendStatus, Friendship, Interest,
    Membership, Message, Profile, ProfilePatch, Swipe,
};

#[derive(Default)]
struct Inner {
    profiles: HashMap<Uuid, Profile>,
    interests: Vec<Interest>,
    user_interests: HashMap<Uuid, Vec<Uuid>>,
    activities: Vec<Activity>,
    swipes: Vec<Swipe>,
    friendships: Vec<Friendship>,
    rooms: Vec<ChatRoom>,
    memberships: Vec<Membership>,
    messages: Vec<Message>,
    blobs: HashMap<String, Vec<u8>>,
}

/// In-memory store with the same uniqueness constraints as the Postgres
/// schema. Backs the tests.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile row directly; test/demo helper.
    pub async fn add_profile(&self, full_name: &str) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: None,
            full_name: Some(full_name.to_string()),
            bio: None,
            location: None,
            avatar_url: None,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().await;
        inner.profiles.insert(profile.id, profile.clone());
        profile
    }

    /// Seeds an interest row directly; test/demo helper.
    pub async fn add_interest(&self, name: &str) -> Interest {
        let interest = Interest {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let mut inner = self.inner.lock().await;
        inner.interests.push(interest.clone());
        interest
    }

    /// Reads a vote row back; test/demo helper.
    pub async fn swipe(&self, user_id: Uuid, activity_id: Uuid) -> Option<Swipe> {
        let inner = self.inner.lock().await;
        inner
            .swipes
            .iter()
            .find(|s| s.user_id == user_id && s.activity_id == activity_id)
            .cloned()
    }

    /// Backdates a message so unread-window tests can order history.
    pub async fn backdate_message(&self, message_id: Uuid, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().await;
        if let Some(message) = inner.messages.iter_mut().find(|m| m.id == message_id) {
            message.created_at = at;
        }
    }
}

impl Store for MemStore {
    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let inner = self.inner.lock().await;
        Ok(inner.profiles.get(&id).cloned())
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.profiles.get(id).cloned())
            .collect())
    }

    async fn upsert_profile(
        &self,
        id: Uuid,
        username: &str,
        full_name: &str,
        bio: &str,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let entry = inner.profiles.entry(id).or_insert_with(|| Profile {
            id,
            username: None,
            full_name: None,
            bio: None,
            location: None,
            avatar_url: None,
            created_at: Utc::now(),
        });
        entry.username = Some(username.to_string());
        entry.full_name = Some(full_name.to_string());
        entry.bio = Some(bio.to_string());
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(profile) = inner.profiles.get_mut(&id) {
            if let Some(full_name) = &patch.full_name {
                profile.full_name = Some(full_name.clone());
            }
            if let Some(bio) = &patch.bio {
                profile.bio = Some(bio.clone());
            }
            if let Some(location) = &patch.location {
                profile.location = Some(location.clone());
            }
        }
        Ok(())
    }

    async fn profiles_excluding(&self, excluded: &[Uuid], limit: i64) -> StoreResult<Vec<Profile>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .profiles
            .values()
            .filter(|p| !excluded.contains(&p.id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn interests(&self) -> StoreResult<Vec<Interest>> {
        let inner = self.inner.lock().await;
        let mut interests = inner.interests.clone();
        interests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(interests)
    }

    async fn user_interests(&self, user_id: Uuid) -> StoreResult<Vec<Interest>> {
        let inner = self.inner.lock().await;
        let ids = inner.user_interests.get(&user_id).cloned().unwrap_or_default();
        let mut interests: Vec<Interest> = inner
            .interests
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect();
        interests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(interests)
    }

    async fn replace_user_interests(&self, user_id: Uuid, interest_ids: &[Uuid]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.user_interests.insert(user_id, interest_ids.to_vec());
        Ok(())
    }

    async fn insert_activity(&self, draft: &ActivityDraft) -> StoreResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            location: draft.location.clone(),
            activity_date: draft.activity_date,
            min_participants: Some(draft.min_participants),
            max_participants: Some(draft.max_participants),
            status: ActivityStatus::Active,
            creator_id: draft.creator_id,
            interest_id: draft.interest_id,
            image_url: draft.image_url.clone(),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().await;
        inner.activities.push(activity.clone());
        Ok(activity)
    }

    async fn activity(&self, id: Uuid) -> StoreResult<Option<Activity>> {
        let inner = self.inner.lock().await;
        Ok(inner.activities.iter().find(|a| a.id == id).cloned())
    }

    async fn active_activities_excluding(&self, excluded: &[Uuid]) -> StoreResult<Vec<Activity>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Active && !excluded.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn activities_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Activity>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .activities
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn activities_by_ids_in_window(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<Activity>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .activities
            .iter()
            .filter(|a| {
                ids.contains(&a.id) && a.activity_date > after && a.activity_date < before
            })
            .cloned()
            .collect())
    }

    async fn insert_swipe(&self, user_id: Uuid, activity_id: Uuid, liked: bool) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner
            .swipes
            .iter()
            .any(|s| s.user_id == user_id && s.activity_id == activity_id);
        if duplicate {
            return Err(StoreError::Conflict);
        }
        inner.swipes.push(Swipe {
            user_id,
            activity_id,
            liked,
            confirmed: false,
            starred: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .swipes
            .retain(|s| !(s.user_id == user_id && s.activity_id == activity_id));
        Ok(())
    }

    async fn swiped_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.activity_id)
            .collect())
    }

    async fn liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.user_id == user_id && s.liked)
            .map(|s| s.activity_id)
            .collect())
    }

    async fn unconfirmed_liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.user_id == user_id && s.liked && !s.confirmed)
            .map(|s| s.activity_id)
            .collect())
    }

    async fn set_swipe_starred(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        starred: bool,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(swipe) = inner
            .swipes
            .iter_mut()
            .find(|s| s.user_id == user_id && s.activity_id == activity_id)
        {
            swipe.starred = starred;
        }
        Ok(())
    }

    async fn confirm_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(swipe) = inner
            .swipes
            .iter_mut()
            .find(|s| s.user_id == user_id && s.activity_id == activity_id)
        {
            swipe.confirmed = true;
        }
        Ok(())
    }

    async fn liked_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.activity_id == activity_id && s.liked)
            .count() as i64)
    }

    async fn confirmed_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.activity_id == activity_id && s.confirmed)
            .count() as i64)
    }

    async fn confirmed_user_ids(&self, activity_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.activity_id == activity_id && s.confirmed)
            .map(|s| s.user_id)
            .collect())
    }

    async fn insert_friendship(&self, from: Uuid, to: Uuid) -> StoreResult<Friendship> {
        let mut inner = self.inner.lock().await;
        let duplicate = inner.friendships.iter().any(|f| {
            (f.user_id_1 == from && f.user_id_2 == to)
                || (f.user_id_1 == to && f.user_id_2 == from)
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        let friendship = Friendship {
            id: Uuid::new_v4(),
            user_id_1: from,
            user_id_2: to,
            status: FriendStatus::Pending,
            created_at: Utc::now(),
        };
        inner.friendships.push(friendship.clone());
        Ok(friendship)
    }

    async fn pending_requests_to(&self, user_id: Uuid) -> StoreResult<Vec<Friendship>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .friendships
            .iter()
            .filter(|f| f.user_id_2 == user_id && f.status == FriendStatus::Pending)
            .cloned()
            .collect())
    }

    async fn accept_friendship(&self, friendship_id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(friendship) = inner.friendships.iter_mut().find(|f| f.id == friendship_id) {
            friendship.status = FriendStatus::Accepted;
        }
        Ok(())
    }

    async fn accepted_friend_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .friendships
            .iter()
            .filter(|f| f.status == FriendStatus::Accepted)
            .filter_map(|f| {
                if f.user_id_1 == user_id {
                    Some(f.user_id_2)
                } else if f.user_id_2 == user_id {
                    Some(f.user_id_1)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn accepted_friend_count(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(self.accepted_friend_ids(user_id).await?.len() as i64)
    }

    async fn related_user_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .friendships
            .iter()
            .filter_map(|f| {
                if f.user_id_1 == user_id {
                    Some(f.user_id_2)
                } else if f.user_id_2 == user_id {
                    Some(f.user_id_1)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn insert_room(
        &self,
        name: Option<&str>,
        creator: Uuid,
        activity_id: Option<Uuid>,
    ) -> StoreResult<ChatRoom> {
        let room = ChatRoom {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            creator,
            activity_id,
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().await;
        inner.rooms.push(room.clone());
        Ok(room)
    }

    async fn room_for_activity(&self, activity_id: Uuid) -> StoreResult<Option<ChatRoom>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rooms
            .iter()
            .find(|r| r.activity_id == Some(activity_id))
            .cloned())
    }

    async fn rooms_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ChatRoom>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rooms
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn add_participants(&self, room_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        // Batch insert is all-or-nothing, matching the SQL statement.
        let duplicate = user_ids.iter().any(|user_id| {
            inner
                .memberships
                .iter()
                .any(|m| m.room_id == room_id && m.user_id == *user_id)
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        for user_id in user_ids {
            inner.memberships.push(Membership {
                room_id,
                user_id: *user_id,
                last_read_at: None,
            });
        }
        Ok(())
    }

    async fn memberships_of_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn participant_ids(&self, room_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.room_id == room_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn participant_count(&self, room_id: Uuid) -> StoreResult<i64> {
        Ok(self.participant_ids(room_id).await?.len() as i64)
    }

    async fn rooms_shared_with(&self, room_ids: &[Uuid], user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && room_ids.contains(&m.room_id))
            .map(|m| m.room_id)
            .collect())
    }

    async fn set_last_read(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(membership) = inner
            .memberships
            .iter_mut()
            .find(|m| m.room_id == room_id && m.user_id == user_id)
        {
            membership.last_read_at = Some(at);
        } else {
            inner.memberships.push(Membership {
                room_id,
                user_id,
                last_read_at: Some(at),
            });
        }
        Ok(())
    }

    async fn insert_message(
        &self,
        room_id: Uuid,
        sender: Uuid,
        content: &str,
    ) -> StoreResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            room_id,
            sender,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let mut inner = self.inner.lock().await;
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn messages(&self, room_id: Uuid) -> StoreResult<Vec<Message>> {
        let inner = self.inner.lock().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn latest_message(&self, room_id: Uuid) -> StoreResult<Option<Message>> {
        Ok(self.messages(room_id).await?.into_iter().last())
    }

    async fn unread_count(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.room_id == room_id && m.created_at > since && m.sender != user_id)
            .count() as i64)
    }

    async fn mutual_friend_count(&self, activity_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        let friends = self.accepted_friend_ids(user_id).await?;
        let inner = self.inner.lock().await;
        Ok(inner
            .swipes
            .iter()
            .filter(|s| s.activity_id == activity_id && s.liked && friends.contains(&s.user_id))
            .count() as i64)
    }

    async fn total_participant_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        self.liked_count(activity_id).await
    }

    async fn upload_image(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> StoreResult<String> {
        let url = format!("mem://{bucket}/{path}");
        let mut inner = self.inner.lock().await;
        inner.blobs.insert(url.clone(), bytes);
        Ok(url)
    }
}

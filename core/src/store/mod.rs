//! The seam to the external auth/relational/storage collaborator. Everything
//! the services need from the backend is expressed as typed operations on
//! [`Store`]; [`PgStore`] speaks to Postgres plus an HTTP object store, and
//! [`MemStore`] backs the tests with the same uniqueness constraints.

pub mod mem;
pub mod pg;
pub mod storage;

pub use mem::MemStore;
pub use pg::PgStore;
pub use storage::StorageClient;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Activity, ActivityDraft, ChatRoom, Friendship, Interest, Membership, Message, Profile,
    ProfilePatch,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness invariant rejected the write: duplicate vote, duplicate
    /// room membership, or duplicate relationship pair. Callers decide
    /// whether this is a no-op or an error.
    #[error("unique constraint violation")]
    Conflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage request failed: {0}")]
    Storage(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync {
    // Profiles
    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>>;
    async fn upsert_profile(
        &self,
        id: Uuid,
        username: &str,
        full_name: &str,
        bio: &str,
    ) -> StoreResult<()>;
    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<()>;
    /// Profiles not in `excluded`, capped at `limit`.
    async fn profiles_excluding(&self, excluded: &[Uuid], limit: i64) -> StoreResult<Vec<Profile>>;

    // Interests
    async fn interests(&self) -> StoreResult<Vec<Interest>>;
    async fn user_interests(&self, user_id: Uuid) -> StoreResult<Vec<Interest>>;
    async fn replace_user_interests(&self, user_id: Uuid, interest_ids: &[Uuid]) -> StoreResult<()>;

    // Activities
    async fn insert_activity(&self, draft: &ActivityDraft) -> StoreResult<Activity>;
    async fn activity(&self, id: Uuid) -> StoreResult<Option<Activity>>;
    /// Active activities whose id is not in `excluded`, oldest first.
    async fn active_activities_excluding(&self, excluded: &[Uuid]) -> StoreResult<Vec<Activity>>;
    async fn activities_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Activity>>;
    async fn activities_by_ids_in_window(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<Activity>>;

    // Swipes
    /// Errors with [`StoreError::Conflict`] when a vote already exists for
    /// this (user, activity) pair.
    async fn insert_swipe(&self, user_id: Uuid, activity_id: Uuid, liked: bool) -> StoreResult<()>;
    async fn delete_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()>;
    async fn swiped_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn unconfirmed_liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn set_swipe_starred(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        starred: bool,
    ) -> StoreResult<()>;
    async fn confirm_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()>;
    async fn liked_count(&self, activity_id: Uuid) -> StoreResult<i64>;
    async fn confirmed_count(&self, activity_id: Uuid) -> StoreResult<i64>;
    async fn confirmed_user_ids(&self, activity_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // Friendships
    /// Errors with [`StoreError::Conflict`] when a relationship row already
    /// exists for this unordered pair.
    async fn insert_friendship(&self, from: Uuid, to: Uuid) -> StoreResult<Friendship>;
    async fn pending_requests_to(&self, user_id: Uuid) -> StoreResult<Vec<Friendship>>;
    async fn accept_friendship(&self, friendship_id: Uuid) -> StoreResult<()>;
    /// Accepted counterparts of `user_id`, regardless of direction.
    async fn accepted_friend_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn accepted_friend_count(&self, user_id: Uuid) -> StoreResult<i64>;
    /// Users touched by any relationship row (any status) with `user_id`.
    async fn related_user_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // Chat
    async fn insert_room(
        &self,
        name: Option<&str>,
        creator: Uuid,
        activity_id: Option<Uuid>,
    ) -> StoreResult<ChatRoom>;
    async fn room_for_activity(&self, activity_id: Uuid) -> StoreResult<Option<ChatRoom>>;
    async fn rooms_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ChatRoom>>;
    /// Batch membership insert. Errors with [`StoreError::Conflict`] when
    /// any of the users is already a member.
    async fn add_participants(&self, room_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()>;
    async fn memberships_of_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>>;
    async fn participant_ids(&self, room_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn participant_count(&self, room_id: Uuid) -> StoreResult<i64>;
    /// Subset of `room_ids` where `user_id` is also a participant.
    async fn rooms_shared_with(&self, room_ids: &[Uuid], user_id: Uuid) -> StoreResult<Vec<Uuid>>;
    async fn set_last_read(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;
    async fn insert_message(
        &self,
        room_id: Uuid,
        sender: Uuid,
        content: &str,
    ) -> StoreResult<Message>;
    async fn messages(&self, room_id: Uuid) -> StoreResult<Vec<Message>>;
    async fn latest_message(&self, room_id: Uuid) -> StoreResult<Option<Message>>;
    /// Messages in `room_id` newer than `since` and not sent by `user_id`.
    async fn unread_count(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64>;

    // Server-side aggregates
    async fn mutual_friend_count(&self, activity_id: Uuid, user_id: Uuid) -> StoreResult<i64>;
    async fn total_participant_count(&self, activity_id: Uuid) -> StoreResult<i64>;

    // Blob storage
    async fn upload_image(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String>;
}

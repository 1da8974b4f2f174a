use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StorageClient, Store, StoreError, StoreResult};
use crate::constants::PG_UNIQUE_VIOLATION;
use crate::models::{
    Activity, ActivityDraft, ChatRoom, Friendship, Interest, Membership, Message, Profile,
    ProfilePatch,
};
use crate::utils::config::Config;

/// Production store: Postgres for rows and aggregates, an HTTP object store
/// for blobs. All queries are runtime-checked; the schema lives in
/// `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    storage: Option<StorageClient>,
}

impl PgStore {
    pub fn new(pool: PgPool, storage: Option<StorageClient>) -> Self {
        Self { pool, storage }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        let storage = config
            .storage_url
            .as_ref()
            .map(|url| StorageClient::new(url, config.storage_key.clone().unwrap_or_default()));

        Ok(Self::new(pool, storage))
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps unique-constraint violations to [`StoreError::Conflict`] so callers
/// can tell a duplicate write from a real failure.
fn map_write_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) {
            return StoreError::Conflict;
        }
    }
    StoreError::Database(err)
}

impl Store for PgStore {
    async fn profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(profiles)
    }

    async fn upsert_profile(
        &self,
        id: Uuid,
        username: &str,
        full_name: &str,
        bio: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, full_name, bio)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET username = EXCLUDED.username,
                full_name = EXCLUDED.full_name,
                bio = EXCLUDED.bio
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(full_name)
        .bind(bio)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                bio = COALESCE($3, bio),
                location = COALESCE($4, location)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.full_name.as_deref())
        .bind(patch.bio.as_deref())
        .bind(patch.location.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn profiles_excluding(&self, excluded: &[Uuid], limit: i64) -> StoreResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE NOT (id = ANY($1)) LIMIT $2",
        )
        .bind(excluded)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn interests(&self) -> StoreResult<Vec<Interest>> {
        let interests =
            sqlx::query_as::<_, Interest>("SELECT id, name FROM interests ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(interests)
    }

    async fn user_interests(&self, user_id: Uuid) -> StoreResult<Vec<Interest>> {
        let interests = sqlx::query_as::<_, Interest>(
            r#"
            SELECT i.id, i.name
            FROM user_interests ui
            JOIN interests i ON i.id = ui.interest_id
            WHERE ui.profile_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interests)
    }

    async fn replace_user_interests(&self, user_id: Uuid, interest_ids: &[Uuid]) -> StoreResult<()> {
        sqlx::query("DELETE FROM user_interests WHERE profile_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if !interest_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_interests (profile_id, interest_id)
                SELECT $1, unnest($2::uuid[])
                "#,
            )
            .bind(user_id)
            .bind(interest_ids)
            .execute(&self.pool)
            .await
            .map_err(map_write_err)?;
        }
        Ok(())
    }

    async fn insert_activity(&self, draft: &ActivityDraft) -> StoreResult<Activity> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities
                (name, description, location, activity_date, min_participants,
                 max_participants, status, creator_id, interest_id, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.location.as_deref())
        .bind(draft.activity_date)
        .bind(draft.min_participants)
        .bind(draft.max_participants)
        .bind(draft.creator_id)
        .bind(draft.interest_id)
        .bind(draft.image_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(activity)
    }

    async fn activity(&self, id: Uuid) -> StoreResult<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(activity)
    }

    async fn active_activities_excluding(&self, excluded: &[Uuid]) -> StoreResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE status = 'active' AND NOT (id = ANY($1))
            ORDER BY created_at
            "#,
        )
        .bind(excluded)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn activities_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            "SELECT * FROM activities WHERE id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn activities_by_ids_in_window(
        &self,
        ids: &[Uuid],
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT * FROM activities
            WHERE id = ANY($1) AND activity_date > $2 AND activity_date < $3
            ORDER BY activity_date
            "#,
        )
        .bind(ids)
        .bind(after)
        .bind(before)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn insert_swipe(&self, user_id: Uuid, activity_id: Uuid, liked: bool) -> StoreResult<()> {
        sqlx::query("INSERT INTO activity_swipes (user_id, activity_id, liked) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(activity_id)
            .bind(liked)
            .execute(&self.pool)
            .await
            .map_err(map_write_err)?;
        Ok(())
    }

    async fn delete_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM activity_swipes WHERE user_id = $1 AND activity_id = $2")
            .bind(user_id)
            .bind(activity_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn swiped_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids =
            sqlx::query_scalar::<_, Uuid>("SELECT activity_id FROM activity_swipes WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT activity_id FROM activity_swipes WHERE user_id = $1 AND liked",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn unconfirmed_liked_activity_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT activity_id FROM activity_swipes WHERE user_id = $1 AND liked AND NOT confirmed",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn set_swipe_starred(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        starred: bool,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE activity_swipes SET starred = $3 WHERE user_id = $1 AND activity_id = $2",
        )
        .bind(user_id)
        .bind(activity_id)
        .bind(starred)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn confirm_swipe(&self, user_id: Uuid, activity_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "UPDATE activity_swipes SET confirmed = TRUE WHERE user_id = $1 AND activity_id = $2",
        )
        .bind(user_id)
        .bind(activity_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn liked_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activity_swipes WHERE activity_id = $1 AND liked",
        )
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn confirmed_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activity_swipes WHERE activity_id = $1 AND confirmed",
        )
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn confirmed_user_ids(&self, activity_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM activity_swipes WHERE activity_id = $1 AND confirmed",
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn insert_friendship(&self, from: Uuid, to: Uuid) -> StoreResult<Friendship> {
        let friendship = sqlx::query_as::<_, Friendship>(
            r#"
            INSERT INTO friendships (user_id_1, user_id_2, status)
            VALUES ($1, $2, 'pending')
            RETURNING *
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(friendship)
    }

    async fn pending_requests_to(&self, user_id: Uuid) -> StoreResult<Vec<Friendship>> {
        let rows = sqlx::query_as::<_, Friendship>(
            r#"
            SELECT * FROM friendships
            WHERE user_id_2 = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn accept_friendship(&self, friendship_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE friendships SET status = 'accepted' WHERE id = $1")
            .bind(friendship_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn accepted_friend_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT CASE WHEN user_id_1 = $1 THEN user_id_2 ELSE user_id_1 END
            FROM friendships
            WHERE (user_id_1 = $1 OR user_id_2 = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn accepted_friend_count(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM friendships
            WHERE (user_id_1 = $1 OR user_id_2 = $1) AND status = 'accepted'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn related_user_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT CASE WHEN user_id_1 = $1 THEN user_id_2 ELSE user_id_1 END
            FROM friendships
            WHERE user_id_1 = $1 OR user_id_2 = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn insert_room(
        &self,
        name: Option<&str>,
        creator: Uuid,
        activity_id: Option<Uuid>,
    ) -> StoreResult<ChatRoom> {
        let room = sqlx::query_as::<_, ChatRoom>(
            r#"
            INSERT INTO chat_rooms (name, creator, activity_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(creator)
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(room)
    }

    async fn room_for_activity(&self, activity_id: Uuid) -> StoreResult<Option<ChatRoom>> {
        let room = sqlx::query_as::<_, ChatRoom>("SELECT * FROM chat_rooms WHERE activity_id = $1")
            .bind(activity_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(room)
    }

    async fn rooms_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<ChatRoom>> {
        let rooms = sqlx::query_as::<_, ChatRoom>(
            "SELECT * FROM chat_rooms WHERE id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    async fn add_participants(&self, room_id: Uuid, user_ids: &[Uuid]) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_room_participants (room_id, participant)
            SELECT $1, unnest($2::uuid[])
            "#,
        )
        .bind(room_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(())
    }

    async fn memberships_of_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT room_id, participant AS user_id, last_read_at
            FROM chat_room_participants
            WHERE participant = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    async fn participant_ids(&self, room_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT participant FROM chat_room_participants WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn participant_count(&self, room_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_room_participants WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn rooms_shared_with(&self, room_ids: &[Uuid], user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT room_id FROM chat_room_participants
            WHERE room_id = ANY($1) AND participant = $2
            "#,
        )
        .bind(room_ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn set_last_read(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_room_participants (room_id, participant, last_read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (room_id, participant) DO UPDATE
            SET last_read_at = EXCLUDED.last_read_at
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_message(
        &self,
        room_id: Uuid,
        sender: Uuid,
        content: &str,
    ) -> StoreResult<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO chat_messages (room_id, sender, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(room_id)
        .bind(sender)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_err)?;
        Ok(message)
    }

    async fn messages(&self, room_id: Uuid) -> StoreResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM chat_messages WHERE room_id = $1 ORDER BY created_at",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn latest_message(&self, room_id: Uuid) -> StoreResult<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM chat_messages
            WHERE room_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn unread_count(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM chat_messages
            WHERE room_id = $1 AND created_at > $2 AND sender <> $3
            "#,
        )
        .bind(room_id)
        .bind(since)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mutual_friend_count(&self, activity_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT get_mutual_friends_count($1, $2)")
            .bind(activity_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn total_participant_count(&self, activity_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT get_total_participant_count($1)")
            .bind(activity_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn upload_image(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StoreResult<String> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StoreError::Other("no object storage configured".to_string()))?;
        storage.upload(bucket, path, bytes, content_type).await
    }
}

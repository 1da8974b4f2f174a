use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::constants::DEFAULT_MIN_PARTICIPANTS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Active,
    Archived,
    Expired,
}

/// A proposed social event, the unit users swipe on. Owned by its creator
/// but a shared read resource; swipers never mutate it directly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub location: Option<String>,
    pub activity_date: DateTime<Utc>,
    pub min_participants: Option<i32>,
    pub max_participants: Option<i32>,
    pub status: ActivityStatus,
    pub creator_id: Uuid,
    pub interest_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Liked-vote count required before the activity counts as viable.
    pub fn quorum(&self) -> i64 {
        i64::from(self.min_participants.unwrap_or(DEFAULT_MIN_PARTICIPANTS))
    }
}

/// A user's like/dislike decision on an activity. At most one row exists
/// per (user, activity); `confirmed` is the second-stage opt-in after
/// quorum and `starred` is a bookmark on a saved vote.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Swipe {
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub liked: bool,
    pub confirmed: bool,
    pub starred: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-activity position in the like -> quorum -> confirmed-room pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationState {
    Open,
    QuorumReached,
    ConfirmedRoomCreated,
}

/// Creation input as collected from the user. The image, if any, is
/// uploaded to object storage before the row insert.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub name: String,
    pub description: String,
    pub location: Option<String>,
    pub activity_date: DateTime<Utc>,
    pub min_participants: Option<i32>,
    pub max_participants: Option<i32>,
    pub interest_id: Option<Uuid>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fully resolved row handed to the store once defaults are applied and the
/// image URL is known.
#[derive(Debug, Clone)]
pub struct ActivityDraft {
    pub name: String,
    pub description: String,
    pub location: Option<String>,
    pub activity_date: DateTime<Utc>,
    pub min_participants: i32,
    pub max_participants: i32,
    pub creator_id: Uuid,
    pub interest_id: Option<Uuid>,
    pub image_url: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Profile;

/// A conversation. Direct rooms carry the sentinel name and exactly two
/// participants; activity rooms reference the activity they were spawned
/// from, at most one room per activity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatRoom {
    pub id: Uuid,
    pub name: Option<String>,
    pub creator: Uuid,
    pub activity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Membership of one user in one room. Unique per (room, user).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl Membership {
    /// A never-read membership counts everything since the epoch as unread.
    pub fn last_read(&self) -> DateTime<Utc> {
        self.last_read_at.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageWithSender {
    pub message: Message,
    pub sender: Option<Profile>,
}

/// Room list entry with the display name and avatar resolved (for direct
/// rooms, from the other participant) and the latest message attached.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPreview {
    pub room_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub last_message: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnreadRoom {
    pub room_id: Uuid,
    pub unread: i64,
}

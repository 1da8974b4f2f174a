use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One entry in the merged updates feed. Not persisted anywhere; derived
/// on demand from the other entities.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpdateItem {
    /// Synthesized from the source category and source row id so repeated
    /// aggregations yield stable identities for list diffing.
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub payload: UpdatePayload,
}

impl UpdateItem {
    pub fn new(payload: UpdatePayload, message: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: payload.synthetic_id(),
            message,
            timestamp,
            payload,
        }
    }
}

/// Click-routing data, tagged per source category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdatePayload {
    FriendRequest { friendship_id: Uuid, sender_id: Uuid },
    UnreadMessages { room_id: Uuid, unread: i64 },
    ActivityReminder { activity_id: Uuid },
    ActivityPopular { activity_id: Uuid, likes: i64 },
    ConfirmationNeeded { activity_id: Uuid },
}

impl UpdatePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FriendRequest { .. } => "friend_request",
            Self::UnreadMessages { .. } => "unread_messages",
            Self::ActivityReminder { .. } => "activity_reminder",
            Self::ActivityPopular { .. } => "activity_popular",
            Self::ConfirmationNeeded { .. } => "confirmation_needed",
        }
    }

    fn source_id(&self) -> Uuid {
        match self {
            Self::FriendRequest { friendship_id, .. } => *friendship_id,
            Self::UnreadMessages { room_id, .. } => *room_id,
            Self::ActivityReminder { activity_id }
            | Self::ActivityPopular { activity_id, .. }
            | Self::ConfirmationNeeded { activity_id } => *activity_id,
        }
    }

    fn synthetic_id(&self) -> String {
        format!("{}:{}", self.kind(), self.source_id())
    }
}

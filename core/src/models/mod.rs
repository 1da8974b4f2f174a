pub mod profile;
pub mod activity;
pub mod chat;
pub mod update;

pub use profile::{Profile, ProfilePatch, Interest, Friendship, FriendStatus, FriendRequest};
pub use activity::{
    Activity, ActivityDraft, ActivityStatus, ImageUpload, NewActivity, ParticipationState, Swipe,
};
pub use chat::{ChatPreview, ChatRoom, Membership, Message, MessageWithSender, UnreadRoom};
pub use update::{UpdateItem, UpdatePayload};

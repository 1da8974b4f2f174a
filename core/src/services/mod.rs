pub mod activities;
pub mod chats;
pub mod friends;
pub mod interests;
pub mod profiles;
pub mod updates;

pub use activities::ActivityService;
pub use chats::ChatService;
pub use friends::FriendService;
pub use interests::InterestService;
pub use profiles::ProfileService;
pub use updates::UpdateService;

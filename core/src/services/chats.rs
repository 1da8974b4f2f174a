//! Conversations: canonical direct-room resolution, group creation,
//! messaging, and unread accounting.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::constants::DIRECT_CHAT_NAME;
use crate::models::{ChatPreview, Message, MessageWithSender, UnreadRoom};
use crate::session::Session;
use crate::store::Store;

pub struct ChatService<S> {
    store: Arc<S>,
    session: Session,
}

impl<S> Clone for ChatService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S: Store> ChatService<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self { store, session }
    }

    /// Rooms the current user belongs to, with display names resolved and
    /// the latest message attached. Direct rooms take the other
    /// participant's name and avatar.
    pub async fn rooms(&self) -> Result<Vec<ChatPreview>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let memberships = self.store.memberships_of_user(user).await?;
        let room_ids: Vec<Uuid> = memberships.iter().map(|m| m.room_id).collect();
        if room_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rooms = self.store.rooms_by_ids(&room_ids).await?;

        let mut previews = Vec::new();
        for room in rooms {
            let named = room.name.as_deref().filter(|name| *name != DIRECT_CHAT_NAME);
            let (name, avatar_url) = match named {
                Some(name) => (name.to_string(), None),
                None => self.direct_room_identity(room.id, user).await?,
            };
            let latest = self.store.latest_message(room.id).await?;
            previews.push(ChatPreview {
                room_id: room.id,
                name,
                avatar_url,
                last_message: latest.as_ref().map(|m| m.content.clone()),
                last_activity: latest.map(|m| m.created_at),
            });
        }
        Ok(previews)
    }

    async fn direct_room_identity(
        &self,
        room_id: Uuid,
        user: Uuid,
    ) -> Result<(String, Option<String>)> {
        let participants = self.store.participant_ids(room_id).await?;
        let other = participants.into_iter().find(|p| *p != user);
        if let Some(other) = other {
            if let Some(profile) = self.store.profile(other).await? {
                return Ok((profile.display_name().to_string(), profile.avatar_url));
            }
        }
        Ok(("Unknown Chat".to_string(), None))
    }

    /// Room history in chronological order with sender profiles attached.
    pub async fn messages(&self, room_id: Uuid) -> Result<Vec<MessageWithSender>> {
        let messages = self.store.messages(room_id).await?;
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let mut sender_ids: Vec<Uuid> = messages.iter().map(|m| m.sender).collect();
        sender_ids.sort();
        sender_ids.dedup();
        let profiles = self.store.profiles_by_ids(&sender_ids).await?;

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = profiles.iter().find(|p| p.id == message.sender).cloned();
                MessageWithSender { message, sender }
            })
            .collect())
    }

    pub async fn send_message(&self, room_id: Uuid, content: &str) -> Result<Message> {
        let user = self.session.require_user()?;
        Ok(self.store.insert_message(room_id, user, content).await?)
    }

    pub async fn latest_message(&self, room_id: Uuid) -> Result<Option<Message>> {
        Ok(self.store.latest_message(room_id).await?)
    }

    /// Finds the canonical 1:1 room with `friend_id`, creating it if absent.
    /// A shared room only qualifies when its membership count is exactly
    /// two; a larger group both happen to be in is not a direct room.
    ///
    /// The scan-then-create sequence is not atomic: two concurrent
    /// resolutions for the same pair can race into two rooms.
    pub async fn start_direct_chat(&self, friend_id: Uuid) -> Result<Uuid> {
        let user = self.session.require_user()?;

        let memberships = self.store.memberships_of_user(user).await?;
        let my_room_ids: Vec<Uuid> = memberships.iter().map(|m| m.room_id).collect();
        if !my_room_ids.is_empty() {
            let shared = self.store.rooms_shared_with(&my_room_ids, friend_id).await?;
            for room_id in shared {
                if self.store.participant_count(room_id).await? == 2 {
                    return Ok(room_id);
                }
            }
        }

        let room = self
            .store
            .insert_room(Some(DIRECT_CHAT_NAME), user, None)
            .await?;
        self.store
            .add_participants(room.id, &[user, friend_id])
            .await?;
        Ok(room.id)
    }

    /// Creates a fresh group room with the creator plus all given members.
    /// Groups are always newly created; no dedup against existing rooms.
    pub async fn create_group_chat(&self, name: &str, member_ids: &[Uuid]) -> Result<Uuid> {
        let user = self.session.require_user()?;
        let room = self.store.insert_room(Some(name), user, None).await?;

        let mut members = Vec::with_capacity(member_ids.len() + 1);
        members.push(user);
        members.extend_from_slice(member_ids);
        self.store.add_participants(room.id, &members).await?;
        Ok(room.id)
    }

    /// Moves the caller's last-read marker to now.
    pub async fn mark_room_read(&self, room_id: Uuid) -> Result<()> {
        let Some(user) = self.session.current_user() else {
            return Ok(());
        };
        self.store.set_last_read(room_id, user, Utc::now()).await?;
        Ok(())
    }

    /// Per-room counts of messages newer than the caller's last-read marker
    /// and not sent by the caller. Rooms with nothing unread are omitted.
    pub async fn unread_summary(&self) -> Result<Vec<UnreadRoom>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let memberships = self.store.memberships_of_user(user).await?;

        let mut summary = Vec::new();
        for membership in memberships {
            let unread = self
                .store
                .unread_count(membership.room_id, user, membership.last_read())
                .await?;
            if unread > 0 {
                summary.push(UnreadRoom {
                    room_id: membership.room_id,
                    unread,
                });
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn service(store: &Arc<MemStore>, user: Uuid) -> ChatService<MemStore> {
        ChatService::new(store.clone(), Session::signed_in(user))
    }

    #[tokio::test]
    async fn direct_chat_resolution_is_stable_across_calls() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let alice_svc = service(&store, alice.id);
        let first = alice_svc.start_direct_chat(bob.id).await.unwrap();
        let second = alice_svc.start_direct_chat(bob.id).await.unwrap();
        assert_eq!(first, second);

        // Resolution from the other side lands in the same room.
        let bob_svc = service(&store, bob.id);
        assert_eq!(bob_svc.start_direct_chat(alice.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn shared_group_room_does_not_satisfy_direct_resolution() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;
        let carol = store.add_profile("Carol").await;

        let alice_svc = service(&store, alice.id);
        let group = alice_svc
            .create_group_chat("Weekend plans", &[bob.id, carol.id])
            .await
            .unwrap();

        let direct = alice_svc.start_direct_chat(bob.id).await.unwrap();
        assert_ne!(group, direct);
        assert_eq!(store.participant_count(direct).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn group_chats_are_never_deduplicated() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let alice_svc = service(&store, alice.id);
        let first = alice_svc.create_group_chat("Trip", &[bob.id]).await.unwrap();
        let second = alice_svc.create_group_chat("Trip", &[bob.id]).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn unread_counts_skip_own_messages() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let alice_svc = service(&store, alice.id);
        let bob_svc = service(&store, bob.id);
        let room = alice_svc.start_direct_chat(bob.id).await.unwrap();

        for text in ["hi", "are you around?", "hello?"] {
            bob_svc.send_message(room, text).await.unwrap();
        }
        let summary = alice_svc.unread_summary().await.unwrap();
        assert_eq!(summary, vec![UnreadRoom { room_id: room, unread: 3 }]);

        // A message alice sends herself does not increment her count.
        alice_svc.send_message(room, "here now").await.unwrap();
        let summary = alice_svc.unread_summary().await.unwrap();
        assert_eq!(summary[0].unread, 3);
    }

    #[tokio::test]
    async fn mark_read_clears_the_unread_summary() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let alice_svc = service(&store, alice.id);
        let room = alice_svc.start_direct_chat(bob.id).await.unwrap();
        service(&store, bob.id)
            .send_message(room, "ping")
            .await
            .unwrap();

        assert_eq!(alice_svc.unread_summary().await.unwrap().len(), 1);
        alice_svc.mark_room_read(room).await.unwrap();
        assert!(alice_svc.unread_summary().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn direct_room_preview_shows_the_other_participant() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice Kowalska").await;
        let bob = store.add_profile("Bob Andersson").await;

        let alice_svc = service(&store, alice.id);
        let room = alice_svc.start_direct_chat(bob.id).await.unwrap();
        service(&store, bob.id)
            .send_message(room, "see you there")
            .await
            .unwrap();

        let previews = alice_svc.rooms().await.unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].name, "Bob Andersson");
        assert_eq!(previews[0].last_message.as_deref(), Some("see you there"));

        let bob_previews = service(&store, bob.id).rooms().await.unwrap();
        assert_eq!(bob_previews[0].name, "Alice Kowalska");
    }

    #[tokio::test]
    async fn messages_carry_sender_profiles_in_order() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        let alice_svc = service(&store, alice.id);
        let room = alice_svc.start_direct_chat(bob.id).await.unwrap();
        alice_svc.send_message(room, "first").await.unwrap();
        service(&store, bob.id)
            .send_message(room, "second")
            .await
            .unwrap();

        let messages = alice_svc.messages(room).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message.content, "first");
        assert_eq!(
            messages[1].sender.as_ref().map(|p| p.display_name()),
            Some("Bob")
        );
    }
}

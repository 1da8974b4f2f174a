//! The top-level client context: one store, one session, the services built
//! over them, and the published feeds the UI subscribes to.

use std::sync::Arc;

use anyhow::Result;

use crate::models::{ChatPreview, Profile, UpdateItem};
use crate::services::{
    ActivityService, ChatService, FriendService, InterestService, ProfileService, UpdateService,
};
use crate::session::Session;
use crate::signal::Signal;
use crate::store::Store;

#[derive(Clone)]
pub struct Mingle<S> {
    session: Session,
    activities: ActivityService<S>,
    friends: FriendService<S>,
    chats: ChatService<S>,
    interests: InterestService<S>,
    profiles: ProfileService<S>,
    updates: UpdateService<S>,
    friends_feed: Signal<Vec<Profile>>,
    chats_feed: Signal<Vec<ChatPreview>>,
    updates_feed: Signal<Vec<UpdateItem>>,
}

impl<S: Store> Mingle<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        let activities = ActivityService::new(store.clone(), session.clone());
        let friends = FriendService::new(store.clone(), session.clone());
        let chats = ChatService::new(store.clone(), session.clone());
        let interests = InterestService::new(store.clone(), session.clone());
        let profiles = ProfileService::new(store.clone(), session.clone());
        let updates = UpdateService::new(activities.clone(), friends.clone(), chats.clone());
        Self {
            session,
            activities,
            friends,
            chats,
            interests,
            profiles,
            updates,
            friends_feed: Signal::default(),
            chats_feed: Signal::default(),
            updates_feed: Signal::default(),
        }
    }

    pub fn with_store(store: S) -> Self {
        Self::new(Arc::new(store), Session::new())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn activities(&self) -> &ActivityService<S> {
        &self.activities
    }

    pub fn friends(&self) -> &FriendService<S> {
        &self.friends
    }

    pub fn chats(&self) -> &ChatService<S> {
        &self.chats
    }

    pub fn interests(&self) -> &InterestService<S> {
        &self.interests
    }

    pub fn profiles(&self) -> &ProfileService<S> {
        &self.profiles
    }

    pub fn updates(&self) -> &UpdateService<S> {
        &self.updates
    }

    /// Re-fetches the friend list and publishes it to subscribers.
    pub async fn refresh_friends(&self) -> Result<Vec<Profile>> {
        let friends = self.friends.friends().await?;
        self.friends_feed.set(friends.clone());
        Ok(friends)
    }

    /// Re-fetches the chat list previews and publishes them.
    pub async fn refresh_chats(&self) -> Result<Vec<ChatPreview>> {
        let rooms = self.chats.rooms().await?;
        self.chats_feed.set(rooms.clone());
        Ok(rooms)
    }

    /// Re-runs the update aggregation and publishes the merged feed.
    pub async fn refresh_updates(&self) -> Result<Vec<UpdateItem>> {
        let items = self.updates.refresh().await?;
        self.updates_feed.set(items.clone());
        Ok(items)
    }

    pub fn friends_feed(&self) -> &Signal<Vec<Profile>> {
        &self.friends_feed
    }

    pub fn chats_feed(&self) -> &Signal<Vec<ChatPreview>> {
        &self.chats_feed
    }

    pub fn updates_feed(&self) -> &Signal<Vec<UpdateItem>> {
        &self.updates_feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[tokio::test]
    async fn refresh_publishes_to_feed_subscribers() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;
        let ab = store.insert_friendship(alice.id, bob.id).await.unwrap();
        store.accept_friendship(ab.id).await.unwrap();

        let app = Mingle::new(store, Session::signed_in(alice.id));
        let rx = app.friends_feed().subscribe();
        assert!(rx.borrow().is_empty());

        app.refresh_friends().await.unwrap();
        assert_eq!(app.friends_feed().get().len(), 1);
        assert_eq!(rx.borrow()[0].id, bob.id);
    }

    #[tokio::test]
    async fn sign_out_makes_feeds_refresh_empty() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;
        let ab = store.insert_friendship(alice.id, bob.id).await.unwrap();
        store.accept_friendship(ab.id).await.unwrap();

        let app = Mingle::new(store, Session::signed_in(alice.id));
        assert_eq!(app.refresh_friends().await.unwrap().len(), 1);

        app.session().sign_out();
        assert!(app.refresh_friends().await.unwrap().is_empty());
        assert!(app.refresh_updates().await.unwrap().is_empty());
    }
}

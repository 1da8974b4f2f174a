//! Social graph over the symmetric relationship table: friend sets, counts,
//! and pending-request handling.

use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use crate::models::{FriendRequest, Profile};
use crate::session::Session;
use crate::store::Store;

pub struct FriendService<S> {
    store: Arc<S>,
    session: Session,
}

impl<S> Clone for FriendService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S: Store> FriendService<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self { store, session }
    }

    /// Inserts a pending relationship from the current user. A request to an
    /// already-pending or already-friended target trips the pair-uniqueness
    /// invariant and propagates; dedup is the caller's concern.
    pub async fn send_request(&self, to: Uuid) -> Result<()> {
        let user = self.session.require_user()?;
        self.store.insert_friendship(user, to).await?;
        Ok(())
    }

    /// Pending requests addressed to the current user, with sender profiles
    /// attached for display.
    pub async fn pending_requests(&self) -> Result<Vec<FriendRequest>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let rows = self.store.pending_requests_to(user).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sender_ids: Vec<Uuid> = rows.iter().map(|r| r.user_id_1).collect();
        let profiles = self.store.profiles_by_ids(&sender_ids).await?;

        Ok(rows
            .into_iter()
            .map(|friendship| {
                let sender = profiles.iter().find(|p| p.id == friendship.user_id_1).cloned();
                FriendRequest { friendship, sender }
            })
            .collect())
    }

    /// Flips the single relationship row to accepted; no reciprocal row is
    /// created since direction is already recorded.
    pub async fn accept_request(&self, friendship_id: Uuid) -> Result<()> {
        self.store.accept_friendship(friendship_id).await?;
        Ok(())
    }

    /// Profiles of everyone in an accepted relationship with the current
    /// user, whichever side they sit on.
    pub async fn friends(&self) -> Result<Vec<Profile>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let ids = self.store.accepted_friend_ids(user).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.profiles_by_ids(&ids).await?)
    }

    pub async fn friend_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.store.accepted_friend_count(user_id).await?)
    }

    /// How many of the current user's friends liked the activity. Computed
    /// server-side; this is an opaque scalar lookup.
    pub async fn mutual_friend_count(&self, activity_id: Uuid) -> Result<i64> {
        let Some(user) = self.session.current_user() else {
            return Ok(0);
        };
        Ok(self.store.mutual_friend_count(activity_id, user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemStore, StoreError};

    fn service(store: &Arc<MemStore>, user: Uuid) -> FriendService<MemStore> {
        FriendService::new(store.clone(), Session::signed_in(user))
    }

    #[tokio::test]
    async fn accepted_relationships_count_from_both_sides() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice Kowalska").await;
        let bob = store.add_profile("Bob Andersson").await;
        let carol = store.add_profile("Carol Zhang").await;

        // alice -> bob, carol -> alice; both accepted.
        let ab = store.insert_friendship(alice.id, bob.id).await.unwrap();
        let ca = store.insert_friendship(carol.id, alice.id).await.unwrap();
        store.accept_friendship(ab.id).await.unwrap();
        store.accept_friendship(ca.id).await.unwrap();

        let alice_svc = service(&store, alice.id);
        let mut names: Vec<String> = alice_svc
            .friends()
            .await
            .unwrap()
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Bob Andersson", "Carol Zhang"]);
        assert_eq!(alice_svc.friend_count(alice.id).await.unwrap(), 2);
        assert_eq!(alice_svc.friend_count(bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pending_requests_are_enriched_with_sender_profiles() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice Kowalska").await;
        let bob = store.add_profile("Bob Andersson").await;

        service(&store, alice.id).send_request(bob.id).await.unwrap();

        let bob_svc = service(&store, bob.id);
        let requests = bob_svc.pending_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].sender.as_ref().map(|p| p.display_name()),
            Some("Alice Kowalska")
        );

        bob_svc
            .accept_request(requests[0].friendship.id)
            .await
            .unwrap();
        assert!(bob_svc.pending_requests().await.unwrap().is_empty());
        assert_eq!(bob_svc.friend_count(bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_request_for_a_pair_propagates_the_conflict() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;

        service(&store, alice.id).send_request(bob.id).await.unwrap();
        // Same pair from the other direction is still one unordered pair.
        let err = service(&store, bob.id)
            .send_request(alice.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Conflict)
        ));
    }

    #[tokio::test]
    async fn mutual_friend_count_is_zero_when_signed_out() {
        let store = Arc::new(MemStore::new());
        let service = FriendService::new(store, Session::new());
        assert_eq!(service.mutual_friend_count(Uuid::new_v4()).await.unwrap(), 0);
    }
}

//! Own-profile management and friend-suggestion discovery.

use std::sync::Arc;

use anyhow::Result;
use rand::Rng;

use crate::constants::{SUGGESTION_LIMIT, USERNAME_SUFFIX_MAX};
use crate::models::{Profile, ProfilePatch};
use crate::session::Session;
use crate::store::Store;

#[derive(Clone)]
pub struct ProfileService<S> {
    store: Arc<S>,
    session: Session,
}

impl<S: Store> ProfileService<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self { store, session }
    }

    /// The current user's profile; `None` when signed out or not yet set up.
    pub async fn me(&self) -> Result<Option<Profile>> {
        let Some(user) = self.session.current_user() else {
            return Ok(None);
        };
        Ok(self.store.profile(user).await?)
    }

    /// First-time profile setup: joins the name parts and generates a
    /// username from the first name plus a random digit suffix.
    pub async fn complete_profile(
        &self,
        first_name: &str,
        last_name: &str,
        bio: &str,
    ) -> Result<()> {
        let user = self.session.require_user()?;

        let full_name = format!("{first_name} {last_name}").trim().to_string();
        let suffix = rand::rng().random_range(0..USERNAME_SUFFIX_MAX);
        let username = format!(
            "{}{}",
            first_name.to_lowercase().replace(char::is_whitespace, ""),
            suffix
        );

        self.store
            .upsert_profile(user, &username, &full_name, bio)
            .await?;
        Ok(())
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<()> {
        let user = self.session.require_user()?;
        self.store.update_profile(user, &patch).await?;
        Ok(())
    }

    /// Profiles to suggest as new friends: everyone except the current user
    /// and anyone already touched by a relationship row, pending or
    /// accepted.
    pub async fn suggestions(&self) -> Result<Vec<Profile>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let mut excluded = self.store.related_user_ids(user).await?;
        excluded.push(user);
        Ok(self
            .store
            .profiles_excluding(&excluded, SUGGESTION_LIMIT)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[tokio::test]
    async fn complete_profile_generates_a_username_from_the_first_name() {
        let store = Arc::new(MemStore::new());
        let user = store.add_profile("placeholder").await;
        let service = ProfileService::new(store.clone(), Session::signed_in(user.id));

        service
            .complete_profile("Anna Maria", "Kowalska", "hiker")
            .await
            .unwrap();

        let me = service.me().await.unwrap().unwrap();
        assert_eq!(me.full_name.as_deref(), Some("Anna Maria Kowalska"));
        assert_eq!(me.bio.as_deref(), Some("hiker"));

        let username = me.username.unwrap();
        assert!(username.starts_with("annamaria"));
        let suffix = &username["annamaria".len()..];
        assert!(suffix.parse::<u32>().unwrap() < USERNAME_SUFFIX_MAX);
    }

    #[tokio::test]
    async fn patch_updates_only_the_given_fields() {
        let store = Arc::new(MemStore::new());
        let user = store.add_profile("Alice").await;
        let service = ProfileService::new(store.clone(), Session::signed_in(user.id));

        service
            .update_profile(ProfilePatch {
                location: Some("Brussels".to_string()),
                ..ProfilePatch::default()
            })
            .await
            .unwrap();

        let me = service.me().await.unwrap().unwrap();
        assert_eq!(me.location.as_deref(), Some("Brussels"));
        assert_eq!(me.full_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn suggestions_exclude_self_and_anyone_already_related() {
        let store = Arc::new(MemStore::new());
        let alice = store.add_profile("Alice").await;
        let bob = store.add_profile("Bob").await;
        let carol = store.add_profile("Carol").await;
        let dave = store.add_profile("Dave").await;

        // bob is pending, carol accepted; only dave should remain.
        store.insert_friendship(alice.id, bob.id).await.unwrap();
        let ac = store.insert_friendship(carol.id, alice.id).await.unwrap();
        store.accept_friendship(ac.id).await.unwrap();

        let service = ProfileService::new(store, Session::signed_in(alice.id));
        let suggestions = service.suggestions().await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].id, dave.id);
    }

    #[tokio::test]
    async fn signed_out_profile_and_suggestions_are_empty() {
        let store = Arc::new(MemStore::new());
        store.add_profile("Alice").await;
        let service = ProfileService::new(store, Session::new());

        assert!(service.me().await.unwrap().is_none());
        assert!(service.suggestions().await.unwrap().is_empty());
        assert!(service.complete_profile("A", "B", "").await.is_err());
    }
}

//! Interest tags: the global catalogue and the user's declared set that
//! drives the deck filter.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use crate::models::Interest;
use crate::session::Session;
use crate::store::Store;

#[derive(Clone)]
pub struct InterestService<S> {
    store: Arc<S>,
    session: Session,
}

impl<S: Store> InterestService<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self { store, session }
    }

    /// The full catalogue, ordered by name.
    pub async fn all(&self) -> Result<Vec<Interest>> {
        Ok(self.store.interests().await?)
    }

    /// The current user's declared interests; empty when signed out.
    pub async fn mine(&self) -> Result<Vec<Interest>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        Ok(self.store.user_interests(user).await?)
    }

    /// Convenience for the deck filter.
    pub async fn my_interest_ids(&self) -> Result<HashSet<Uuid>> {
        Ok(self.mine().await?.into_iter().map(|i| i.id).collect())
    }

    /// Replaces the current user's interest set with the deduplicated ids,
    /// preserving first-occurrence order.
    pub async fn set_mine(&self, interest_ids: Vec<Uuid>) -> Result<()> {
        let user = self.session.require_user()?;

        let mut seen = HashSet::new();
        let unique: Vec<Uuid> = interest_ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        self.store.replace_user_interests(user, &unique).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    #[tokio::test]
    async fn replacing_interests_deduplicates_the_input() {
        let store = Arc::new(MemStore::new());
        let sports = store.add_interest("sports").await;
        let culture = store.add_interest("culture").await;
        let user = store.add_profile("Alice").await;

        let service = InterestService::new(store.clone(), Session::signed_in(user.id));
        service
            .set_mine(vec![sports.id, culture.id, sports.id])
            .await
            .unwrap();

        let mine = service.mine().await.unwrap();
        assert_eq!(mine.len(), 2);

        service.set_mine(vec![culture.id]).await.unwrap();
        let ids = service.my_interest_ids().await.unwrap();
        assert_eq!(ids, HashSet::from([culture.id]));
    }

    #[tokio::test]
    async fn catalogue_is_ordered_by_name() {
        let store = Arc::new(MemStore::new());
        store.add_interest("sports").await;
        store.add_interest("culture").await;
        store.add_interest("party").await;

        let service = InterestService::new(store, Session::new());
        let names: Vec<String> = service
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["culture", "party", "sports"]);
        assert!(service.mine().await.unwrap().is_empty());
    }
}

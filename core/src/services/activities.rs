//! Activity feed, vote recording, and the participation resolver: likes
//! accumulate toward quorum, confirmations accumulate toward the activity
//! chat room.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::constants::{
    ACTIVITY_IMAGE_BUCKET, DEFAULT_MAX_PARTICIPANTS, DEFAULT_MIN_PARTICIPANTS,
    UPCOMING_WINDOW_HOURS,
};
use crate::models::{Activity, ActivityDraft, ImageUpload, NewActivity, ParticipationState};
use crate::session::Session;
use crate::store::{Store, StoreError};

pub struct ActivityService<S> {
    store: Arc<S>,
    session: Session,
}

impl<S> Clone for ActivityService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S: Store> ActivityService<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        Self { store, session }
    }

    /// Creates an activity owned by the current user. The image, if any, is
    /// uploaded first and its public URL stored on the row.
    pub async fn create(&self, new: NewActivity) -> Result<Activity> {
        let user = self.session.require_user()?;

        let image_url = match new.image {
            Some(image) => Some(self.upload_image(image).await?),
            None => None,
        };

        let draft = ActivityDraft {
            name: new.name,
            description: new.description,
            location: new.location,
            activity_date: new.activity_date,
            min_participants: new.min_participants.unwrap_or(DEFAULT_MIN_PARTICIPANTS),
            max_participants: new.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            creator_id: user,
            interest_id: new.interest_id,
            image_url,
        };
        Ok(self.store.insert_activity(&draft).await?)
    }

    async fn upload_image(&self, image: ImageUpload) -> Result<String> {
        let path = format!(
            "public/{}-{}",
            Utc::now().timestamp_millis(),
            image.file_name
        );
        let url = self
            .store
            .upload_image(ACTIVITY_IMAGE_BUCKET, &path, image.bytes, &image.content_type)
            .await?;
        Ok(url)
    }

    /// Active activities the current user has not voted on yet, in stable
    /// order. Empty when signed out.
    pub async fn feed(&self) -> Result<Vec<Activity>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let swiped = self.store.swiped_activity_ids(user).await?;
        Ok(self.store.active_activities_excluding(&swiped).await?)
    }

    /// Records a like/dislike vote. A repeat vote for the same activity is
    /// rejected by the store's uniqueness invariant and treated as a no-op;
    /// any other failure propagates.
    pub async fn record_swipe(&self, activity_id: Uuid, liked: bool) -> Result<()> {
        let user = self.session.require_user()?;
        match self.store.insert_swipe(user, activity_id, liked).await {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict) => {
                tracing::debug!(%activity_id, "duplicate swipe ignored");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the current user's vote ("unsaving" the activity).
    pub async fn remove_saved(&self, activity_id: Uuid) -> Result<()> {
        let Some(user) = self.session.current_user() else {
            return Ok(());
        };
        self.store.delete_swipe(user, activity_id).await?;
        Ok(())
    }

    /// Activities the current user liked.
    pub async fn saved(&self) -> Result<Vec<Activity>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let liked = self.store.liked_activity_ids(user).await?;
        if liked.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.activities_by_ids(&liked).await?)
    }

    pub async fn upcoming_saved(&self) -> Result<Vec<Activity>> {
        let now = Utc::now();
        let mut saved = self.saved().await?;
        saved.retain(|a| a.activity_date > now);
        Ok(saved)
    }

    pub async fn past_saved(&self) -> Result<Vec<Activity>> {
        let now = Utc::now();
        let mut saved = self.saved().await?;
        saved.retain(|a| a.activity_date < now);
        Ok(saved)
    }

    /// Liked activities scheduled within the reminder window.
    pub async fn upcoming_liked(&self) -> Result<Vec<Activity>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let liked = self.store.liked_activity_ids(user).await?;
        if liked.is_empty() {
            return Ok(Vec::new());
        }
        let now = Utc::now();
        let until = now + Duration::hours(UPCOMING_WINDOW_HOURS);
        Ok(self
            .store
            .activities_by_ids_in_window(&liked, now, until)
            .await?)
    }

    /// Liked activities whose liked-vote count has reached quorum, with the
    /// current count attached.
    pub async fn popular_liked(&self) -> Result<Vec<(Activity, i64)>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let liked = self.store.liked_activity_ids(user).await?;
        if liked.is_empty() {
            return Ok(Vec::new());
        }
        let activities = self.store.activities_by_ids(&liked).await?;

        let mut popular = Vec::new();
        for activity in activities {
            let likes = self.store.liked_count(activity.id).await?;
            if likes >= activity.quorum() {
                popular.push((activity, likes));
            }
        }
        Ok(popular)
    }

    /// Toggles the bookmark star on a saved vote.
    pub async fn toggle_star(&self, activity_id: Uuid, starred: bool) -> Result<()> {
        let user = self.session.require_user()?;
        self.store
            .set_swipe_starred(user, activity_id, starred)
            .await?;
        Ok(())
    }

    pub async fn participant_count(&self, activity_id: Uuid) -> Result<i64> {
        Ok(self.store.total_participant_count(activity_id).await?)
    }

    /// Liked, not-yet-confirmed activities that have reached quorum and are
    /// waiting on the current user's second-stage opt-in.
    pub async fn awaiting_confirmation(&self) -> Result<Vec<Activity>> {
        let Some(user) = self.session.current_user() else {
            return Ok(Vec::new());
        };
        let unconfirmed = self.store.unconfirmed_liked_activity_ids(user).await?;
        if unconfirmed.is_empty() {
            return Ok(Vec::new());
        }
        let activities = self.store.activities_by_ids(&unconfirmed).await?;

        let mut ready = Vec::new();
        for activity in activities {
            let count = self.store.total_participant_count(activity.id).await?;
            if count >= activity.quorum() {
                ready.push(activity);
            }
        }
        Ok(ready)
    }

    /// Where the activity sits in the like -> quorum -> room pipeline.
    pub async fn participation_state(&self, activity_id: Uuid) -> Result<ParticipationState> {
        if self.store.room_for_activity(activity_id).await?.is_some() {
            return Ok(ParticipationState::ConfirmedRoomCreated);
        }
        let Some(activity) = self.store.activity(activity_id).await? else {
            anyhow::bail!("activity {activity_id} not found");
        };
        let likes = self.store.liked_count(activity_id).await?;
        if likes >= activity.quorum() {
            Ok(ParticipationState::QuorumReached)
        } else {
            Ok(ParticipationState::Open)
        }
    }

    /// Confirms the current user's participation. Once confirmations reach
    /// quorum the activity room is found-or-created: an existing room is
    /// reused and the user joins it, otherwise a new room is created with
    /// every currently confirmed participant as a member. Membership
    /// conflicts are swallowed; other failures propagate.
    pub async fn confirm_participation(&self, activity_id: Uuid) -> Result<()> {
        let user = self.session.require_user()?;
        self.store.confirm_swipe(user, activity_id).await?;

        let confirmed = self.store.confirmed_count(activity_id).await?;
        let Some(activity) = self.store.activity(activity_id).await? else {
            return Ok(());
        };
        if confirmed < activity.quorum() {
            return Ok(());
        }

        if let Some(room) = self.store.room_for_activity(activity_id).await? {
            match self.store.add_participants(room.id, &[user]).await {
                Ok(()) | Err(StoreError::Conflict) => Ok(()),
                Err(err) => Err(err.into()),
            }
        } else {
            let members = self.store.confirmed_user_ids(activity_id).await?;
            let room_name = format!("{} chat", activity.name);
            let room = self
                .store
                .insert_room(Some(&room_name), user, Some(activity_id))
                .await?;
            match self.store.add_participants(room.id, &members).await {
                Ok(()) | Err(StoreError::Conflict) => Ok(()),
                Err(err) => Err(err.into()),
            }
        }
    }
}

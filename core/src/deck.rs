//! Swipe deck: the ordered queue of not-yet-voted activities, the interest
//! filter over it, and the headless gesture state machine that turns a drag
//! into a like/dislike decision.

use std::collections::HashSet;

use uuid::Uuid;

use crate::constants::{SWIPE_ROTATION_DIVISOR, SWIPE_THRESHOLD};
use crate::models::Activity;

/// Interest filter over the candidate queue, preserving relative order.
/// A disabled filter passes the list through untouched; an enabled filter
/// with no declared interests yields an empty deck.
pub fn filter_by_interests(
    all: &[Activity],
    interests: &HashSet<Uuid>,
    enabled: bool,
) -> Vec<Activity> {
    if !enabled {
        return all.to_vec();
    }
    if interests.is_empty() {
        return Vec::new();
    }
    all.iter()
        .filter(|activity| {
            activity
                .interest_id
                .is_some_and(|id| interests.contains(&id))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDecision {
    Liked,
    Disliked,
}

impl SwipeDecision {
    pub fn liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}

/// Drag state for the top card, mirroring the pointer handlers of the UI.
/// Displacement accumulates between `begin` and `release`; only a release
/// past the threshold produces a decision, anything shorter snaps back to
/// neutral.
#[derive(Debug, Default)]
pub struct Gesture {
    dragging: bool,
    start_x: f64,
    start_y: f64,
    dx: f64,
    dy: f64,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, x: f64, y: f64) {
        self.dragging = true;
        self.start_x = x;
        self.start_y = y;
        self.dx = 0.0;
        self.dy = 0.0;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        if !self.dragging {
            return;
        }
        self.dx = x - self.start_x;
        self.dy = y - self.start_y;
    }

    pub fn release(&mut self) -> Option<SwipeDecision> {
        if !self.dragging {
            return None;
        }
        let dx = self.dx;
        self.reset();
        if dx > SWIPE_THRESHOLD {
            Some(SwipeDecision::Liked)
        } else if dx < -SWIPE_THRESHOLD {
            Some(SwipeDecision::Disliked)
        } else {
            None
        }
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Cosmetic card tilt as a function of displacement.
    pub fn rotation(&self) -> f64 {
        self.dx / SWIPE_ROTATION_DIVISOR
    }

    /// Like/dislike indicator strength, saturating at the threshold.
    pub fn indicator_opacity(&self) -> f64 {
        (self.dx.abs() / SWIPE_THRESHOLD).min(1.0)
    }

    fn reset(&mut self) {
        self.dragging = false;
        self.dx = 0.0;
        self.dy = 0.0;
    }
}

/// Ordered candidate queue plus its interest-filtered view. Decisions remove
/// the activity from both without refetching.
#[derive(Debug, Default)]
pub struct Deck {
    all: Vec<Activity>,
    visible: Vec<Activity>,
    interests: HashSet<Uuid>,
    filter_enabled: bool,
}

impl Deck {
    pub fn new(all: Vec<Activity>) -> Self {
        let visible = all.clone();
        Self {
            all,
            visible,
            interests: HashSet::new(),
            filter_enabled: false,
        }
    }

    pub fn set_interests(&mut self, interests: HashSet<Uuid>) {
        self.interests = interests;
        self.refilter();
    }

    pub fn set_filter_enabled(&mut self, enabled: bool) {
        self.filter_enabled = enabled;
        self.refilter();
    }

    /// Next card to present, if any.
    pub fn top(&self) -> Option<&Activity> {
        self.visible.first()
    }

    pub fn visible(&self) -> &[Activity] {
        &self.visible
    }

    pub fn all(&self) -> &[Activity] {
        &self.all
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Drop a decided activity from both queues.
    pub fn remove(&mut self, activity_id: Uuid) {
        self.all.retain(|a| a.id != activity_id);
        self.visible.retain(|a| a.id != activity_id);
    }

    fn refilter(&mut self) {
        self.visible = filter_by_interests(&self.all, &self.interests, self.filter_enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityStatus;
    use chrono::Utc;

    fn activity(interest_id: Option<Uuid>) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            name: "Board Games Afternoon".to_string(),
            description: "Bring your favourite board game".to_string(),
            location: None,
            activity_date: Utc::now(),
            min_participants: Some(2),
            max_participants: Some(12),
            status: ActivityStatus::Active,
            creator_id: Uuid::new_v4(),
            interest_id,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn ids(activities: &[Activity]) -> Vec<Uuid> {
        activities.iter().map(|a| a.id).collect()
    }

    #[test]
    fn disabled_filter_passes_through_in_order() {
        let sports = Uuid::new_v4();
        let all = vec![activity(Some(sports)), activity(None), activity(Some(sports))];
        let interests = HashSet::from([Uuid::new_v4()]);

        let visible = filter_by_interests(&all, &interests, false);
        assert_eq!(ids(&visible), ids(&all));
    }

    #[test]
    fn enabled_filter_with_no_interests_is_empty() {
        let all = vec![activity(Some(Uuid::new_v4())), activity(None)];
        let visible = filter_by_interests(&all, &HashSet::new(), true);
        assert!(visible.is_empty());
    }

    #[test]
    fn enabled_filter_keeps_matching_tags_in_original_order() {
        let sports = Uuid::new_v4();
        let culture = Uuid::new_v4();
        let a = activity(Some(sports));
        let b = activity(Some(culture));
        let c = activity(Some(sports));
        let d = activity(None);
        let all = vec![a.clone(), b, c.clone(), d];

        let visible = filter_by_interests(&all, &HashSet::from([sports]), true);
        assert_eq!(ids(&visible), vec![a.id, c.id]);
    }

    #[test]
    fn drag_past_threshold_is_a_like() {
        let mut gesture = Gesture::new();
        gesture.begin(10.0, 10.0);
        gesture.move_to(160.0, 20.0);
        assert_eq!(gesture.release(), Some(SwipeDecision::Liked));
    }

    #[test]
    fn drag_past_negative_threshold_is_a_dislike() {
        let mut gesture = Gesture::new();
        gesture.begin(0.0, 0.0);
        gesture.move_to(-150.0, 0.0);
        let decision = gesture.release();
        assert_eq!(decision, Some(SwipeDecision::Disliked));
        assert!(!decision.unwrap().liked());
    }

    #[test]
    fn short_drag_resets_to_neutral_without_a_decision() {
        let mut gesture = Gesture::new();
        gesture.begin(0.0, 0.0);
        gesture.move_to(50.0, 5.0);
        assert_eq!(gesture.release(), None);
        assert_eq!(gesture.dx(), 0.0);
        assert_eq!(gesture.rotation(), 0.0);
    }

    #[test]
    fn release_without_begin_is_a_no_op() {
        let mut gesture = Gesture::new();
        assert_eq!(gesture.release(), None);
    }

    #[test]
    fn rotation_and_opacity_track_displacement() {
        let mut gesture = Gesture::new();
        gesture.begin(0.0, 0.0);
        gesture.move_to(60.0, 0.0);
        assert_eq!(gesture.rotation(), 3.0);
        assert_eq!(gesture.indicator_opacity(), 0.5);

        gesture.move_to(300.0, 0.0);
        assert_eq!(gesture.indicator_opacity(), 1.0);
    }

    #[test]
    fn decision_removes_from_both_queues() {
        let sports = Uuid::new_v4();
        let a = activity(Some(sports));
        let b = activity(Some(sports));
        let mut deck = Deck::new(vec![a.clone(), b.clone()]);
        deck.set_interests(HashSet::from([sports]));
        deck.set_filter_enabled(true);

        assert_eq!(deck.top().map(|t| t.id), Some(a.id));
        deck.remove(a.id);
        assert_eq!(ids(deck.all()), vec![b.id]);
        assert_eq!(ids(deck.visible()), vec![b.id]);
    }
}

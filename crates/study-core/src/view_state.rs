use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::Chapter;

/// Result of marking a card as viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkOutcome {
    pub viewed: usize,
    pub total: usize,
    /// True only on the call that completed the mission.
    pub completed_now: bool,
}

/// Which cards of the current chapter have been opened during this visit.
///
/// Volatile: the owning visit builds a fresh one whenever the chapter changes.
#[derive(Debug, Clone)]
pub struct ViewState {
    chapter_id: String,
    card_ids: HashSet<String>,
    viewed: HashSet<String>,
    mission_complete: bool,
}

impl ViewState {
    pub fn for_chapter(chapter: &Chapter) -> Self {
        Self {
            chapter_id: chapter.id.clone(),
            card_ids: chapter.cards.iter().map(|c| c.id.clone()).collect(),
            viewed: HashSet::new(),
            mission_complete: false,
        }
    }

    /// Idempotent. Ids outside the chapter are ignored so the viewed set
    /// always stays a subset of the chapter's cards.
    pub fn mark_card_viewed(&mut self, card_id: &str) -> MarkOutcome {
        if !self.card_ids.contains(card_id) {
            debug!(chapter = %self.chapter_id, card = card_id, "ignoring card outside chapter");
            return self.outcome(false);
        }

        if !self.viewed.insert(card_id.to_string()) {
            return self.outcome(false);
        }

        let completed_now = !self.mission_complete && self.viewed.len() == self.card_ids.len();
        if completed_now {
            self.mission_complete = true;
            info!(chapter = %self.chapter_id, cards = self.card_ids.len(), "mission complete");
        }
        self.outcome(completed_now)
    }

    pub fn reset(&mut self) {
        self.viewed.clear();
        self.mission_complete = false;
    }

    pub fn is_viewed(&self, card_id: &str) -> bool {
        self.viewed.contains(card_id)
    }

    pub fn viewed_count(&self) -> usize {
        self.viewed.len()
    }

    pub fn total(&self) -> usize {
        self.card_ids.len()
    }

    pub fn is_mission_complete(&self) -> bool {
        self.mission_complete
    }

    /// Share of viewed cards in `[0, 100]`; an empty chapter reports 0.
    pub fn progress_percent(&self) -> f64 {
        if self.card_ids.is_empty() {
            return 0.0;
        }
        let pct = 100.0 * self.viewed.len() as f64 / self.card_ids.len() as f64;
        pct.clamp(0.0, 100.0)
    }

    pub fn progress_rounded(&self) -> u8 {
        self.progress_percent().round() as u8
    }

    fn outcome(&self, completed_now: bool) -> MarkOutcome {
        MarkOutcome {
            viewed: self.viewed.len(),
            total: self.card_ids.len(),
            completed_now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::chapter;

    #[test]
    fn marking_is_idempotent() {
        let mut state = ViewState::for_chapter(&chapter("c", &["a", "b", "c"]));
        assert_eq!(state.mark_card_viewed("a").viewed, 1);
        assert_eq!(state.mark_card_viewed("a").viewed, 1);
        assert_eq!(state.viewed_count(), 1);
        assert!(state.is_viewed("a"));
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut state = ViewState::for_chapter(&chapter("c", &["a", "b", "c"]));
        let calls = ["a", "b", "b", "c"];
        let fired: Vec<bool> = calls
            .iter()
            .map(|id| state.mark_card_viewed(id).completed_now)
            .collect();
        assert_eq!(fired, [false, false, false, true]);
        assert!(state.is_mission_complete());
        assert!(!state.mark_card_viewed("c").completed_now);
        assert!(state.is_mission_complete());
    }

    #[test]
    fn unknown_cards_are_ignored() {
        let mut state = ViewState::for_chapter(&chapter("c", &["a"]));
        let outcome = state.mark_card_viewed("elsewhere");
        assert_eq!(outcome.viewed, 0);
        assert!(!outcome.completed_now);
        assert!(!state.is_viewed("elsewhere"));
    }

    #[test]
    fn progress_handles_empty_chapter() {
        let state = ViewState::for_chapter(&chapter("empty", &[]));
        assert_eq!(state.progress_percent(), 0.0);
        assert!(!state.progress_percent().is_nan());
        assert_eq!(state.progress_rounded(), 0);
        assert!(!state.is_mission_complete());
    }

    #[test]
    fn progress_tracks_viewed_share() {
        let mut state = ViewState::for_chapter(&chapter("c", &["a", "b", "c"]));
        state.mark_card_viewed("a");
        assert_eq!(state.progress_rounded(), 33);
        state.mark_card_viewed("b");
        assert_eq!(state.progress_rounded(), 67);
        state.mark_card_viewed("c");
        assert_eq!(state.progress_percent(), 100.0);
    }

    #[test]
    fn reset_clears_progress_and_completion() {
        let mut state = ViewState::for_chapter(&chapter("c", &["a"]));
        assert!(state.mark_card_viewed("a").completed_now);
        state.reset();
        assert_eq!(state.viewed_count(), 0);
        assert!(!state.is_mission_complete());
        assert!(state.mark_card_viewed("a").completed_now);
    }
}

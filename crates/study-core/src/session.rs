use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::content::ContentStore;
use crate::model::Chapter;
use crate::navigation::ChapterCursor;
use crate::notification::Toast;
use crate::scheduler::{
    AnimationTiming, DelayedActivation, RegionState, SequentialActivation, VisibilityChange,
    VisibilityObserver,
};
use crate::view_state::{MarkOutcome, ViewState};

/// Result of clicking a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenCard {
    Opened(MarkOutcome),
    /// The card is still animating in; nothing was recorded.
    NotReady,
    NotInChapter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardStatus {
    pub revealed: bool,
    pub ready: bool,
    pub viewed: bool,
}

/// Timers started when the card grid first becomes visible.
struct VisitAnimation {
    reveal: SequentialActivation,
    readiness: Vec<DelayedActivation>,
    connectors: DelayedActivation,
}

impl VisitAnimation {
    fn new(card_count: usize, timing: &AnimationTiming) -> Self {
        Self {
            reveal: SequentialActivation::new(card_count, timing.sequence_base_delay),
            readiness: (0..card_count)
                .map(|i| DelayedActivation::new(timing.card_ready_after(i)))
                .collect(),
            connectors: DelayedActivation::new(timing.connectors_after(card_count)),
        }
    }

    fn trigger(&mut self) {
        self.reveal.trigger();
        for ready in &mut self.readiness {
            ready.trigger();
        }
        self.connectors.trigger();
    }
}

/// Everything scoped to one visit of one chapter. Dropping the visit
/// cancels all of its timers.
///
/// Construction spawns nothing. Timers start on the first `Entered` sample
/// and on [`ChapterVisit::replay`], which must run inside a Tokio runtime
/// unless the timing is [`AnimationTiming::reduced`].
pub struct ChapterVisit {
    chapter_index: usize,
    chapter_id: String,
    /// (card id, card title) in display order
    cards: Vec<(String, String)>,
    timing: AnimationTiming,
    region: VisibilityObserver,
    loading_until: Instant,
    animation: VisitAnimation,
    view: ViewState,
    concepts_announced: bool,
    pending: Vec<Toast>,
}

impl ChapterVisit {
    pub fn new(chapter_index: usize, chapter: &Chapter, timing: AnimationTiming) -> Self {
        Self {
            chapter_index,
            chapter_id: chapter.id.clone(),
            cards: chapter
                .cards
                .iter()
                .map(|c| (c.id.clone(), c.title.clone()))
                .collect(),
            timing,
            region: VisibilityObserver::new(timing.region_threshold, true),
            loading_until: Instant::now() + timing.loading_delay,
            animation: VisitAnimation::new(chapter.cards.len(), &timing),
            view: ViewState::for_chapter(chapter),
            concepts_announced: false,
            pending: Vec::new(),
        }
    }

    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter_id
    }

    /// Feeds a visibility sample for the card grid. The first `Entered`
    /// starts the reveal, readiness and connector timers.
    pub fn observe_region(&mut self, intersection_ratio: f64) -> Option<VisibilityChange> {
        let change = self.region.observe(intersection_ratio);
        if change == Some(VisibilityChange::Entered) {
            debug!(chapter = %self.chapter_id, ratio = intersection_ratio, "card grid visible");
            self.animation.trigger();
        }
        change
    }

    pub fn region_state(&self) -> RegionState {
        self.region.state()
    }

    pub fn is_loading(&self) -> bool {
        Instant::now() < self.loading_until
    }

    pub fn card_status(&self, index: usize) -> CardStatus {
        let Some((id, _)) = self.cards.get(index) else {
            return CardStatus::default();
        };
        CardStatus {
            revealed: self.animation.reveal.is_activated(index),
            ready: self
                .animation
                .readiness
                .get(index)
                .is_some_and(|r| r.is_activated()),
            viewed: self.view.is_viewed(id),
        }
    }

    pub fn card_statuses(&self) -> Vec<CardStatus> {
        (0..self.cards.len()).map(|i| self.card_status(i)).collect()
    }

    pub fn all_revealed(&self) -> bool {
        self.animation.reveal.all_activated()
    }

    pub fn connectors_visible(&self) -> bool {
        self.animation.connectors.is_activated()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn open_card(&mut self, card_id: &str) -> OpenCard {
        let Some(index) = self.cards.iter().position(|(id, _)| id == card_id) else {
            return OpenCard::NotInChapter;
        };

        if !self.card_status(index).ready {
            let title = &self.cards[index].1;
            self.pending.push(Toast::card_not_ready(title));
            return OpenCard::NotReady;
        }

        let outcome = self.view.mark_card_viewed(card_id);
        if outcome.completed_now {
            self.pending.push(Toast::mission_complete());
        }
        OpenCard::Opened(outcome)
    }

    /// Shows the loading overlay again and redraws the connectors. Cards
    /// that are already revealed stay revealed; viewed cards are kept.
    pub fn replay(&mut self) {
        self.loading_until = Instant::now() + self.timing.replay_loading_delay;
        // connectors still on their first schedule will show on their own
        if self.all_revealed() && self.region.state() == RegionState::Seen {
            let mut connectors = DelayedActivation::new(self.timing.connector_settle_delay);
            connectors.trigger();
            self.animation.connectors = connectors;
            self.concepts_announced = false;
        }
        debug!(chapter = %self.chapter_id, "animations replayed");
    }

    /// Takes every toast raised since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Toast> {
        if !self.concepts_announced && self.connectors_visible() {
            self.concepts_announced = true;
            self.pending.push(Toast::concepts_loaded());
        }
        std::mem::take(&mut self.pending)
    }
}

/// One learner's pass through the board: cursor plus the current visit.
pub struct BoardSession {
    store: Arc<ContentStore>,
    timing: AnimationTiming,
    cursor: ChapterCursor,
    visit: ChapterVisit,
}

impl BoardSession {
    pub fn new(store: Arc<ContentStore>, timing: AnimationTiming) -> Self {
        let cursor = ChapterCursor::new(store.len());
        let visit = ChapterVisit::new(0, &store.chapters()[0], timing);
        Self {
            store,
            timing,
            cursor,
            visit,
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn cursor(&self) -> ChapterCursor {
        self.cursor
    }

    pub fn current_chapter(&self) -> &Chapter {
        &self.store.chapters()[self.cursor.index()]
    }

    pub fn visit(&self) -> &ChapterVisit {
        &self.visit
    }

    pub fn visit_mut(&mut self) -> &mut ChapterVisit {
        &mut self.visit
    }

    pub fn next(&mut self) -> bool {
        let moved = self.cursor.next();
        if moved {
            self.enter_current();
        }
        moved
    }

    pub fn previous(&mut self) -> bool {
        let moved = self.cursor.previous();
        if moved {
            self.enter_current();
        }
        moved
    }

    pub fn jump_to(&mut self, index: usize) -> bool {
        let moved = self.cursor.jump_to(index);
        if moved {
            self.enter_current();
        }
        moved
    }

    fn enter_current(&mut self) {
        let index = self.cursor.index();
        let chapter = &self.store.chapters()[index];
        info!(chapter = %chapter.id, position = %self.cursor.label(), "entering chapter");
        self.visit = ChapterVisit::new(index, chapter, self.timing);
    }
}

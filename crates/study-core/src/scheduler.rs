use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

/// Every delay and visibility threshold used when revealing a chapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTiming {
    /// Gap between consecutive card reveals
    pub sequence_base_delay: Duration,
    /// Extra per-index delay of a card's own entrance
    pub card_stagger: Duration,
    /// Time after a card's entrance before it accepts clicks
    pub card_ready_delay: Duration,
    /// Pause between the last reveal and drawing connectors
    pub connector_settle_delay: Duration,
    /// Skeleton time when a chapter opens
    pub loading_delay: Duration,
    /// Skeleton time after a replay
    pub replay_loading_delay: Duration,
    /// Visible share of the card grid that starts the sequence
    pub region_threshold: f64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            sequence_base_delay: Duration::from_millis(800),
            card_stagger: Duration::from_millis(200),
            card_ready_delay: Duration::from_millis(2000),
            connector_settle_delay: Duration::from_millis(500),
            loading_delay: Duration::from_millis(1000),
            replay_loading_delay: Duration::from_millis(800),
            region_threshold: 0.2,
        }
    }
}

impl AnimationTiming {
    /// Reduced-motion timing: same threshold, no delays.
    pub fn reduced() -> Self {
        Self {
            sequence_base_delay: Duration::ZERO,
            card_stagger: Duration::ZERO,
            card_ready_delay: Duration::ZERO,
            connector_settle_delay: Duration::ZERO,
            loading_delay: Duration::ZERO,
            replay_loading_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay from the region trigger until card `index` accepts clicks.
    pub fn card_ready_after(&self, index: usize) -> Duration {
        (self.sequence_base_delay + self.card_stagger) * index as u32 + self.card_ready_delay
    }

    /// Delay from the region trigger until connectors are drawn.
    pub fn connectors_after(&self, item_count: usize) -> Duration {
        self.sequence_base_delay * item_count.saturating_sub(1) as u32
            + self.connector_settle_delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Entered,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Unseen,
    Seen,
}

/// Turns intersection-ratio samples for one region into visibility edges.
///
/// The only state transition is `Unseen -> Seen`. With `fire_once` the
/// observer reports a single `Entered` and then ignores every sample;
/// otherwise it reports each crossing of the threshold in both directions.
#[derive(Debug, Clone)]
pub struct VisibilityObserver {
    threshold: f64,
    fire_once: bool,
    state: RegionState,
    visible: bool,
}

impl VisibilityObserver {
    pub fn new(threshold: f64, fire_once: bool) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            fire_once,
            state: RegionState::Unseen,
            visible: false,
        }
    }

    pub fn observe(&mut self, intersection_ratio: f64) -> Option<VisibilityChange> {
        let ratio = if intersection_ratio.is_nan() {
            0.0
        } else {
            intersection_ratio.clamp(0.0, 1.0)
        };
        // a zero threshold still needs some intersection
        let now_visible = ratio > 0.0 && ratio >= self.threshold;

        if self.fire_once && self.state == RegionState::Seen {
            return None;
        }

        match (self.visible, now_visible) {
            (false, true) => {
                self.visible = true;
                self.state = RegionState::Seen;
                Some(VisibilityChange::Entered)
            }
            (true, false) => {
                self.visible = false;
                Some(VisibilityChange::Left)
            }
            _ => None,
        }
    }

    pub fn state(&self) -> RegionState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationStep {
    pub delay: Duration,
    pub index: usize,
}

/// The full activation schedule, computed before any timer starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPlan {
    steps: Vec<ActivationStep>,
}

impl ActivationPlan {
    pub fn sequential(item_count: usize, base_delay: Duration) -> Self {
        let steps = (0..item_count)
            .map(|index| ActivationStep {
                delay: base_delay * index as u32,
                index,
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[ActivationStep] {
        &self.steps
    }

    /// Number of steps due once `elapsed` has passed since the trigger.
    pub fn due_at(&self, elapsed: Duration) -> usize {
        self.steps.iter().filter(|s| s.delay <= elapsed).count()
    }
}

/// Append-only set of activated indexes in `0..item_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationState {
    item_count: usize,
    activated: BTreeSet<usize>,
}

impl ActivationState {
    pub fn new(item_count: usize) -> Self {
        Self {
            item_count,
            activated: BTreeSet::new(),
        }
    }

    /// Returns false for out-of-range or already active indexes.
    pub fn activate(&mut self, index: usize) -> bool {
        index < self.item_count && self.activated.insert(index)
    }

    pub fn is_activated(&self, index: usize) -> bool {
        self.activated.contains(&index)
    }

    /// Vacuously true for zero items.
    pub fn all_activated(&self) -> bool {
        self.activated.len() == self.item_count
    }

    pub fn activated_count(&self) -> usize {
        self.activated.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.activated.iter().copied()
    }
}

/// Reveals `item_count` items one after another once triggered.
///
/// A single driver task walks the [`ActivationPlan`], sleeping until each
/// step's deadline, so activations land strictly in index order. Must be
/// triggered from within a Tokio runtime. Dropping the value aborts the driver.
#[derive(Debug)]
pub struct SequentialActivation {
    base_delay: Duration,
    rx: watch::Receiver<ActivationState>,
    tx: Option<watch::Sender<ActivationState>>,
    driver: Option<JoinHandle<()>>,
}

impl SequentialActivation {
    pub fn new(item_count: usize, base_delay: Duration) -> Self {
        let (tx, rx) = watch::channel(ActivationState::new(item_count));
        Self {
            base_delay,
            rx,
            tx: Some(tx),
            driver: None,
        }
    }

    /// Starts the schedule. Later calls are no-ops.
    pub fn trigger(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let started = Instant::now();
        let item_count = self.rx.borrow().item_count();
        let plan = ActivationPlan::sequential(item_count, self.base_delay);
        let (immediate, pending): (Vec<ActivationStep>, Vec<ActivationStep>) =
            plan.steps().iter().copied().partition(|s| s.delay.is_zero());

        if !immediate.is_empty() {
            tx.send_modify(|state| {
                for step in &immediate {
                    state.activate(step.index);
                }
            });
        }

        debug!(
            items = item_count,
            base_delay_ms = self.base_delay.as_millis() as u64,
            pending = pending.len(),
            "sequential activation triggered"
        );

        if !pending.is_empty() {
            self.driver = Some(tokio::spawn(drive_sequence(tx, pending, started)));
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.is_none()
    }

    pub fn is_activated(&self, index: usize) -> bool {
        self.rx.borrow().is_activated(index)
    }

    pub fn all_activated(&self) -> bool {
        self.rx.borrow().all_activated()
    }

    pub fn snapshot(&self) -> ActivationState {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActivationState> {
        self.rx.clone()
    }

    /// Cancels every pending activation. Already active indexes stay active.
    pub fn teardown(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for SequentialActivation {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn drive_sequence(
    tx: watch::Sender<ActivationState>,
    steps: Vec<ActivationStep>,
    started: Instant,
) {
    for step in steps {
        sleep_until(started + step.delay).await;
        if tx.is_closed() {
            trace!(index = step.index, "activation owner gone, stopping");
            return;
        }
        tx.send_modify(|state| {
            state.activate(step.index);
        });
    }
}

/// A single flag that flips `delay` after the first trigger.
#[derive(Debug)]
pub struct DelayedActivation {
    delay: Duration,
    rx: watch::Receiver<bool>,
    tx: Option<watch::Sender<bool>>,
    driver: Option<JoinHandle<()>>,
}

impl DelayedActivation {
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            delay,
            rx,
            tx: Some(tx),
            driver: None,
        }
    }

    /// Starts the timer. A zero delay flips the flag immediately; later calls are no-ops.
    pub fn trigger(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        if self.delay.is_zero() {
            tx.send_replace(true);
            return;
        }
        let deadline = Instant::now() + self.delay;
        self.driver = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            if !tx.is_closed() {
                tx.send_replace(true);
            }
        }));
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.is_none()
    }

    pub fn is_activated(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }

    pub fn teardown(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for DelayedActivation {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::sleep;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fire_once_observer_latches() {
        let mut obs = VisibilityObserver::new(0.2, true);
        assert_eq!(obs.observe(0.1), None);
        assert_eq!(obs.state(), RegionState::Unseen);
        assert_eq!(obs.observe(0.25), Some(VisibilityChange::Entered));
        assert_eq!(obs.observe(0.0), None);
        assert_eq!(obs.observe(0.9), None);
        assert_eq!(obs.state(), RegionState::Seen);
    }

    #[test]
    fn repeating_observer_reports_each_crossing() {
        let mut obs = VisibilityObserver::new(0.5, false);
        assert_eq!(obs.observe(0.6), Some(VisibilityChange::Entered));
        assert_eq!(obs.observe(0.7), None);
        assert_eq!(obs.observe(0.1), Some(VisibilityChange::Left));
        assert_eq!(obs.state(), RegionState::Seen);
        assert_eq!(obs.observe(0.5), Some(VisibilityChange::Entered));
        assert!(obs.is_visible());
    }

    #[test]
    fn observer_sanitizes_ratios() {
        let mut obs = VisibilityObserver::new(0.0, true);
        assert_eq!(obs.observe(f64::NAN), None);
        assert_eq!(obs.observe(0.0), None);
        assert_eq!(obs.observe(7.0), Some(VisibilityChange::Entered));
    }

    #[test]
    fn plan_delays_grow_with_index() {
        let plan = ActivationPlan::sequential(3, ms(100));
        let delays: Vec<Duration> = plan.steps().iter().map(|s| s.delay).collect();
        assert_eq!(delays, [ms(0), ms(100), ms(200)]);
        assert_eq!(plan.due_at(ms(0)), 1);
        assert_eq!(plan.due_at(ms(150)), 2);
        assert_eq!(plan.due_at(ms(5000)), 3);
    }

    #[test]
    fn activation_state_is_bounded() {
        let mut state = ActivationState::new(2);
        assert!(state.activate(1));
        assert!(!state.activate(1));
        assert!(!state.activate(2));
        assert!(!state.all_activated());
        assert!(state.activate(0));
        assert!(state.all_activated());
        assert!(ActivationState::new(0).all_activated());
    }

    #[test]
    fn timing_offsets() {
        let timing = AnimationTiming::default();
        assert_eq!(timing.card_ready_after(0), ms(2000));
        assert_eq!(timing.card_ready_after(2), ms(4000));
        assert_eq!(timing.connectors_after(4), ms(2900));
        assert_eq!(timing.connectors_after(0), ms(500));
        assert_eq!(AnimationTiming::reduced().card_ready_after(3), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_activation_respects_delays() {
        let mut seq = SequentialActivation::new(5, ms(100));
        assert!(!seq.is_activated(0));
        seq.trigger();
        assert!(seq.is_activated(0));

        sleep(ms(199)).await;
        assert!(seq.is_activated(1));
        assert!(!seq.is_activated(2));

        sleep(ms(2)).await;
        assert!(seq.is_activated(2));
        assert!(!seq.all_activated());

        sleep(ms(198)).await;
        assert!(!seq.is_activated(4));
        assert!(!seq.all_activated());

        sleep(ms(2)).await;
        assert!(seq.is_activated(4));
        assert!(seq.all_activated());
    }

    #[tokio::test(start_paused = true)]
    async fn activations_arrive_as_a_growing_prefix() {
        let mut seq = SequentialActivation::new(4, ms(50));
        let mut rx = seq.subscribe();
        seq.trigger();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            let indexes: Vec<usize> = snapshot.indexes().collect();
            let prefix: Vec<usize> = (0..snapshot.activated_count()).collect();
            assert_eq!(indexes, prefix);
            if snapshot.all_activated() {
                break;
            }
            rx.changed().await.expect("driver alive until done");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_steps() {
        let mut seq = SequentialActivation::new(5, ms(100));
        seq.trigger();
        sleep(ms(150)).await;
        seq.teardown();
        sleep(ms(1000)).await;
        assert_eq!(seq.snapshot().activated_count(), 2);
        assert!(!seq.all_activated());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_owner_leaves_state_untouched() {
        let rx = {
            let mut seq = SequentialActivation::new(3, ms(100));
            seq.trigger();
            seq.subscribe()
        };
        sleep(ms(500)).await;
        assert_eq!(rx.borrow().activated_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_trigger_does_not_restart() {
        let mut seq = SequentialActivation::new(3, ms(100));
        seq.trigger();
        sleep(ms(150)).await;
        seq.trigger();
        assert!(seq.is_triggered());
        sleep(ms(60)).await;
        assert!(seq.is_activated(2));
    }

    #[tokio::test]
    async fn zero_delay_and_zero_items_complete_immediately() {
        let mut instant = SequentialActivation::new(3, Duration::ZERO);
        instant.trigger();
        assert!(instant.all_activated());

        let mut empty = SequentialActivation::new(0, ms(100));
        assert!(empty.all_activated());
        empty.trigger();
        assert!(empty.all_activated());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_activation_flips_once_after_delay() {
        let mut flag = DelayedActivation::new(ms(300));
        sleep(ms(1000)).await;
        assert!(!flag.is_activated(), "untriggered flag never flips");

        flag.trigger();
        sleep(ms(299)).await;
        assert!(!flag.is_activated());
        sleep(ms(2)).await;
        assert!(flag.is_activated());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_activation_teardown_is_silent() {
        let mut flag = DelayedActivation::new(ms(300));
        flag.trigger();
        flag.teardown();
        sleep(ms(600)).await;
        assert!(!flag.is_activated());
    }

    #[tokio::test]
    async fn zero_delay_flag_flips_synchronously() {
        let mut flag = DelayedActivation::new(Duration::ZERO);
        flag.trigger();
        assert!(flag.is_activated());
    }
}

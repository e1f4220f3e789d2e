//! Viewport tracker state machine
//!
//! [`ViewportTracker`] owns everything one scroll-spy instance knows: its
//! configuration, the resolved targets, the last published [`ViewState`] and
//! the pending timers. It never touches a UI tree directly. Hosts feed it
//! [`TrackerEvent`]s together with a [`SpyEnvironment`] and the current time,
//! and execute the [`Effect`]s it hands back.
//!
//! # Lifecycle
//!
//! ```text
//!            Mount                         Unmount
//!   Idle ------------> Mounted ------------------------> TornDown
//!                       |   ^
//!                       +---+ Configure / Scroll / Tick
//! ```
//!
//! Every mount or reconfiguration resolves the targets and schedules a settle
//! scan; scroll events go through the [`RateLimiter`]. Once torn down every
//! event is ignored, so a timer a host forgot to cancel cannot publish.

use spyglass_core::{
    compute_view_state, scrolled_past, RootSelector, RootSnapshot, SpyConfig, TargetGeometry,
    ViewState,
};

use std::rc::Rc;

use crate::error::{Result, SpyError};
use crate::throttle::{RateLimiter, ThrottleDecision, TrailingThrottle};
use crate::timer::{TimerId, TimerQueue};

/// Host services the tracker needs
pub trait SpyEnvironment {
    /// Handle type produced by target resolution
    type Target: TargetGeometry;

    /// Look up a target element by id
    fn resolve_target(&self, id: &str) -> Option<Self::Target>;

    /// Measure a scroll root, `None` when it does not exist
    fn root_snapshot(&self, root: &RootSelector) -> Option<RootSnapshot>;
}

/// Callback invoked when an observed root scrolls
///
/// UI event delivery is single-threaded, so callbacks are `Rc` rather than `Arc`.
pub type ScrollCallback = Rc<dyn Fn()>;

/// Delivers scroll notifications for a root
pub trait ScrollEventSource {
    /// Token returned by `subscribe`, handed back to `unsubscribe`
    type Subscription;

    /// Register `callback` for scrolls of `root`, `None` when the root does not exist
    fn subscribe(&self, root: &RootSelector, callback: ScrollCallback) -> Option<Self::Subscription>;

    /// Remove a registration; unknown subscriptions are ignored
    fn unsubscribe(&self, root: &RootSelector, subscription: Self::Subscription);
}

/// Resolve `items` in order, recording missing ids as `None`
pub fn resolve_targets<E: SpyEnvironment + ?Sized>(
    env: &E,
    items: &[String],
) -> Vec<Option<E::Target>> {
    items
        .iter()
        .map(|id| {
            let target = env.resolve_target(id);
            if target.is_none() {
                tracing::debug!(id = %id, "spy target not found");
            }
            target
        })
        .collect()
}

/// Events driving the tracker
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Attach to the configured root and schedule the first scan
    Mount,
    /// Replace the configuration
    Configure(Box<SpyConfig>),
    /// The observed root scrolled
    Scroll,
    /// Time passed; run whatever timers are due
    Tick,
    /// Detach and stop
    Unmount,
}

/// Side effect for the host to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start delivering scroll events from this root
    Subscribe(RootSelector),
    /// Stop delivering scroll events from this root
    Unsubscribe(RootSelector),
}

/// Outcome of one [`ViewportTracker::update`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Freshly computed state, if a scan ran
    pub published: Option<ViewState>,
    /// Whether the published state differs from the previous one
    pub changed: bool,
    /// Subscriptions to change
    pub effects: Vec<Effect>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn with_effects(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            ..Self::default()
        }
    }
}

/// Tracker lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerPhase {
    Idle,
    Mounted,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanTask {
    Settle,
    Trailing,
}

/// Scroll-spy state machine
pub struct ViewportTracker<T> {
    config: SpyConfig,
    phase: TrackerPhase,
    targets: Vec<Option<T>>,
    state: ViewState,
    timers: TimerQueue<ScanTask>,
    settle_timer: Option<TimerId>,
    limiter: Box<dyn RateLimiter>,
    scan_count: u64,
}

impl<T: TargetGeometry> ViewportTracker<T> {
    /// Create a tracker throttled by a [`TrailingThrottle`] at `config.throttle_ms`
    pub fn new(config: SpyConfig) -> Result<Self> {
        let limiter = TrailingThrottle::new(config.throttle_ms);
        Self::with_rate_limiter(config, Box::new(limiter))
    }

    /// Create a tracker with a custom rate limiter
    pub fn with_rate_limiter(config: SpyConfig, limiter: Box<dyn RateLimiter>) -> Result<Self> {
        config.validate()?;
        let state = empty_state(config.items.len(), config.tracks_scrolled_past());
        Ok(Self {
            config,
            phase: TrackerPhase::Idle,
            targets: Vec::new(),
            state,
            timers: TimerQueue::new(),
            settle_timer: None,
            limiter,
            scan_count: 0,
        })
    }

    pub fn config(&self) -> &SpyConfig {
        &self.config
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    /// Last published state
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Targets resolved at the last mount or reconfiguration
    pub fn targets(&self) -> &[Option<T>] {
        &self.targets
    }

    /// Earliest pending timer, for hosts that sleep until the next tick
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Number of scans run so far
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Advance the state machine
    ///
    /// Fails only when a [`TrackerEvent::Configure`] carries an invalid
    /// configuration, in which case the tracker keeps its previous one.
    pub fn update<E>(&mut self, event: TrackerEvent, env: &E, now_ms: u64) -> Result<Transition>
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        if self.phase == TrackerPhase::TornDown {
            tracing::trace!(?event, "event after unmount ignored");
            return Ok(Transition::none());
        }

        match event {
            TrackerEvent::Mount => Ok(self.mount(env, now_ms)),
            TrackerEvent::Configure(config) => self.configure(*config, env, now_ms),
            TrackerEvent::Scroll => Ok(self.scroll(env, now_ms)),
            TrackerEvent::Tick => Ok(self.tick(env, now_ms)),
            TrackerEvent::Unmount => Ok(self.unmount()),
        }
    }

    /// Scan the stored targets against the current root without publishing
    pub fn scan<E>(&self, env: &E) -> Result<ViewState>
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        let root = env
            .root_snapshot(&self.config.root)
            .ok_or_else(|| SpyError::RootUnavailable(self.config.root.clone()))?;
        Ok(compute_view_state(
            &self.targets,
            &root,
            &self.config.scan_options(),
        ))
    }

    fn mount<E>(&mut self, env: &E, now_ms: u64) -> Transition
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        if self.phase == TrackerPhase::Mounted {
            return Transition::none();
        }

        tracing::debug!(root = %self.config.root, items = self.config.items.len(), "spy mounted");
        self.phase = TrackerPhase::Mounted;
        self.initialize(env, now_ms);
        Transition::with_effects(vec![Effect::Subscribe(self.config.root.clone())])
    }

    fn configure<E>(&mut self, config: SpyConfig, env: &E, now_ms: u64) -> Result<Transition>
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        config.validate()?;

        let root_changed = self.config.root != config.root;
        let items_changed = self.config.items != config.items;
        let previous = std::mem::replace(&mut self.config, config);
        self.limiter.set_interval(self.config.throttle_ms);

        if self.phase != TrackerPhase::Mounted {
            self.state = empty_state(
                self.config.items.len(),
                self.config.tracks_scrolled_past(),
            );
            return Ok(Transition::none());
        }

        tracing::debug!(
            items_changed,
            root_changed,
            targets = self.config.items.len(),
            "spy reconfigured, resolving targets"
        );

        resize_state(
            &mut self.state,
            self.config.items.len(),
            self.config.tracks_scrolled_past(),
        );
        self.initialize(env, now_ms);

        let effects = if root_changed {
            vec![
                Effect::Unsubscribe(previous.root),
                Effect::Subscribe(self.config.root.clone()),
            ]
        } else {
            Vec::new()
        };
        Ok(Transition::with_effects(effects))
    }

    fn scroll<E>(&mut self, env: &E, now_ms: u64) -> Transition
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        if self.phase != TrackerPhase::Mounted {
            return Transition::none();
        }

        match self.limiter.request(now_ms) {
            ThrottleDecision::RunNow => self.publish(env),
            ThrottleDecision::Schedule { deadline_ms } => {
                self.timers.schedule(deadline_ms, ScanTask::Trailing);
                Transition::none()
            }
            ThrottleDecision::Coalesced => Transition::none(),
        }
    }

    fn tick<E>(&mut self, env: &E, now_ms: u64) -> Transition
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        let due = self.timers.take_due(now_ms);
        if due.is_empty() {
            return Transition::none();
        }

        for (id, task) in &due {
            match task {
                ScanTask::Settle => {
                    if self.settle_timer == Some(*id) {
                        self.settle_timer = None;
                    }
                }
                ScanTask::Trailing => self.limiter.fire(now_ms),
            }
        }

        // Due timers share one scan; they would all read the same geometry.
        self.publish(env)
    }

    fn unmount(&mut self) -> Transition {
        if self.phase == TrackerPhase::Idle {
            self.phase = TrackerPhase::TornDown;
            return Transition::none();
        }

        tracing::debug!(root = %self.config.root, "spy unmounted");
        self.phase = TrackerPhase::TornDown;
        self.timers.clear();
        self.settle_timer = None;
        self.limiter.reset();
        Transition::with_effects(vec![Effect::Unsubscribe(self.config.root.clone())])
    }

    /// Resolve targets and schedule the settle scan, replacing a pending one
    fn initialize<E>(&mut self, env: &E, now_ms: u64)
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        self.targets = resolve_targets(env, &self.config.items);

        if let Some(id) = self.settle_timer.take() {
            self.timers.cancel(id);
        }
        let deadline = now_ms.saturating_add(self.config.settle_delay_ms);
        self.settle_timer = Some(self.timers.schedule(deadline, ScanTask::Settle));
    }

    fn publish<E>(&mut self, env: &E) -> Transition
    where
        E: SpyEnvironment<Target = T> + ?Sized,
    {
        let state = match self.scan(env) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!("Skipping scroll-spy scan: {}", err);
                return Transition::none();
            }
        };

        self.scan_count += 1;
        let changed = state != self.state;
        if changed {
            tracing::debug!(current = ?state.current_index(), "spy state changed");
        }
        self.state = state.clone();

        Transition {
            published: Some(state),
            changed,
            effects: Vec::new(),
        }
    }
}

fn empty_state(len: usize, track_scrolled_past: bool) -> ViewState {
    ViewState {
        in_view: Vec::new(),
        out_view: (0..len).collect(),
        view_status: vec![false; len],
        scrolled_past: track_scrolled_past.then(|| vec![false; len]),
    }
}

/// Fit a published state to a new item count, padding with `false`
fn resize_state(state: &mut ViewState, len: usize, track_scrolled_past: bool) {
    state.view_status.resize(len, false);
    state.in_view = (0..len).filter(|&i| state.view_status[i]).collect();
    state.out_view = (0..len).filter(|&i| !state.view_status[i]).collect();
    state.scrolled_past = track_scrolled_past.then(|| scrolled_past(&state.view_status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::Unthrottled;
    use spyglass_core::Rect;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    const VIEWPORT: f32 = 100.0;

    #[derive(Debug, Clone)]
    struct Section {
        y: f32,
        height: f32,
        scroll: Rc<Cell<f32>>,
    }

    impl TargetGeometry for Section {
        fn bounding_rect(&self) -> Rect {
            Rect::new(0.0, self.y - self.scroll.get(), 100.0, self.height)
        }

        fn offset_height(&self) -> f32 {
            self.height
        }
    }

    /// Document-rooted page with sections laid out in content coordinates
    struct Page {
        sections: HashMap<String, (f32, f32)>,
        content_height: f32,
        scroll: Rc<Cell<f32>>,
        root_available: bool,
    }

    impl Page {
        fn new(sections: &[(&str, f32, f32)]) -> Self {
            let content_height = sections
                .iter()
                .map(|&(_, y, h)| y + h)
                .fold(VIEWPORT, f32::max);
            Self {
                sections: sections
                    .iter()
                    .map(|&(id, y, h)| (id.to_string(), (y, h)))
                    .collect(),
                content_height,
                scroll: Rc::new(Cell::new(0.0)),
                root_available: true,
            }
        }

        fn scroll_to(&self, offset: f32) {
            self.scroll.set(offset);
        }
    }

    impl SpyEnvironment for Page {
        type Target = Section;

        fn resolve_target(&self, id: &str) -> Option<Section> {
            self.sections.get(id).map(|&(y, height)| Section {
                y,
                height,
                scroll: self.scroll.clone(),
            })
        }

        fn root_snapshot(&self, root: &RootSelector) -> Option<RootSnapshot> {
            if !self.root_available || *root != RootSelector::Document {
                return None;
            }
            Some(RootSnapshot {
                scroll_offset: self.scroll.get(),
                viewport_height: VIEWPORT,
                scroll_height: self.content_height,
                rect: Rect::new(0.0, 0.0, 100.0, VIEWPORT),
            })
        }
    }

    fn three_sections() -> Page {
        Page::new(&[("a", 0.0, 200.0), ("b", 200.0, 200.0), ("c", 400.0, 40.0)])
    }

    fn config(items: &[&str]) -> SpyConfig {
        SpyConfig::new("is-current").with_items(items.iter().copied())
    }

    fn mounted(page: &Page, items: &[&str]) -> ViewportTracker<Section> {
        let mut tracker = ViewportTracker::new(config(items)).unwrap();
        tracker.update(TrackerEvent::Mount, page, 0).unwrap();
        tracker
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = ViewportTracker::<Section>::new(SpyConfig::new(""));
        assert!(matches!(result, Err(SpyError::Config(_))));
    }

    #[test]
    fn test_mount_subscribes_and_settles() {
        let page = three_sections();
        let mut tracker = ViewportTracker::new(config(&["a", "b", "c"])).unwrap();

        let transition = tracker.update(TrackerEvent::Mount, &page, 0).unwrap();
        assert_eq!(
            transition.effects,
            vec![Effect::Subscribe(RootSelector::Document)]
        );
        assert!(transition.published.is_none());
        assert_eq!(tracker.next_deadline(), Some(100));

        let early = tracker.update(TrackerEvent::Tick, &page, 99).unwrap();
        assert!(early.published.is_none());

        let settled = tracker.update(TrackerEvent::Tick, &page, 100).unwrap();
        let state = settled.published.unwrap();
        assert_eq!(state.view_status, vec![true, false, false]);
        assert!(settled.changed);
        assert_eq!(tracker.scan_count(), 1);
    }

    #[test]
    fn test_scroll_is_throttled_to_one_trailing_scan() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a", "b", "c"]);
        tracker.update(TrackerEvent::Tick, &page, 100).unwrap();

        for (now, offset) in [(200, 50.0), (220, 150.0), (260, 250.0)] {
            page.scroll_to(offset);
            let transition = tracker.update(TrackerEvent::Scroll, &page, now).unwrap();
            assert!(transition.published.is_none());
        }
        assert_eq!(tracker.next_deadline(), Some(300));

        let transition = tracker.update(TrackerEvent::Tick, &page, 300).unwrap();
        let state = transition.published.unwrap();
        // Geometry is read at fire time: offset 250 puts "b" first in view
        assert_eq!(state.view_status, vec![false, true, false]);
        assert_eq!(tracker.scan_count(), 2);
    }

    #[test]
    fn test_unthrottled_scroll_scans_immediately() {
        let page = three_sections();
        let mut tracker =
            ViewportTracker::with_rate_limiter(config(&["a", "b"]), Box::new(Unthrottled))
                .unwrap();
        tracker.update(TrackerEvent::Mount, &page, 0).unwrap();

        page.scroll_to(210.0);
        let transition = tracker.update(TrackerEvent::Scroll, &page, 5).unwrap();
        assert_eq!(
            transition.published.unwrap().view_status,
            vec![false, true]
        );
    }

    #[test]
    fn test_bottom_edge_promotes_last_section() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a", "b", "c"]);

        page.scroll_to(340.0);
        tracker.update(TrackerEvent::Scroll, &page, 10).unwrap();
        let transition = tracker.update(TrackerEvent::Tick, &page, 110).unwrap();

        let state = transition.published.unwrap();
        assert_eq!(state.view_status, vec![false, false, true]);
        assert_eq!(state.in_view, vec![2]);
    }

    #[test]
    fn test_missing_ids_are_never_current() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["missing", "b"]);
        assert!(tracker.targets()[0].is_none());

        page.scroll_to(10.0);
        let state = tracker
            .update(TrackerEvent::Tick, &page, 100)
            .unwrap()
            .published
            .unwrap();
        assert_eq!(state.view_status, vec![false, false]);
    }

    #[test]
    fn test_reconfigure_resizes_and_replaces_settle_scan() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a", "b", "c"]);
        tracker.update(TrackerEvent::Tick, &page, 100).unwrap();

        let shorter = config(&["a", "b"]).with_scrolled_past_class("is-past");
        let transition = tracker
            .update(TrackerEvent::Configure(Box::new(shorter)), &page, 150)
            .unwrap();
        assert!(transition.effects.is_empty());
        assert_eq!(tracker.state().view_status, vec![true, false]);
        assert_eq!(tracker.state().scrolled_past, Some(vec![false, false]));
        assert_eq!(tracker.targets().len(), 2);

        let longer = config(&["a", "b", "c", "d"]);
        tracker
            .update(TrackerEvent::Configure(Box::new(longer)), &page, 180)
            .unwrap();
        assert_eq!(tracker.state().view_status, vec![true, false, false, false]);

        // Only the latest settle scan remains
        assert_eq!(tracker.next_deadline(), Some(280));
        assert!(tracker
            .update(TrackerEvent::Tick, &page, 250)
            .unwrap()
            .published
            .is_none());
        assert!(tracker
            .update(TrackerEvent::Tick, &page, 280)
            .unwrap()
            .published
            .is_some());
    }

    #[test]
    fn test_root_change_swaps_subscription() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a"]);

        let moved = config(&["a"]).with_root(RootSelector::element("sidebar"));
        let transition = tracker
            .update(TrackerEvent::Configure(Box::new(moved)), &page, 10)
            .unwrap();
        assert_eq!(
            transition.effects,
            vec![
                Effect::Unsubscribe(RootSelector::Document),
                Effect::Subscribe(RootSelector::element("sidebar")),
            ]
        );
    }

    #[test]
    fn test_reconfigure_with_same_items_resolves_again() {
        let mut page = three_sections();
        let mut tracker = mounted(&page, &["a", "late"]);
        assert!(tracker.targets()[1].is_none());

        page.sections.insert("late".to_string(), (400.0, 40.0));
        tracker
            .update(TrackerEvent::Configure(Box::new(config(&["a", "late"]))), &page, 50)
            .unwrap();
        assert!(tracker.targets()[1].is_some());
        assert_eq!(tracker.next_deadline(), Some(150));
    }

    #[test]
    fn test_events_stay_pointer_sized() {
        assert!(std::mem::size_of::<TrackerEvent>() <= 2 * std::mem::size_of::<usize>());
    }

    #[test]
    fn test_invalid_reconfigure_keeps_previous_config() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a"]);

        let result = tracker.update(TrackerEvent::Configure(Box::new(SpyConfig::new(""))), &page, 10);
        assert!(result.is_err());
        assert_eq!(tracker.config().current_class_name, "is-current");
    }

    #[test]
    fn test_unavailable_root_skips_scan() {
        let mut page = three_sections();
        let mut tracker = mounted(&page, &["a"]);
        page.root_available = false;

        let transition = tracker.update(TrackerEvent::Tick, &page, 100).unwrap();
        assert!(transition.published.is_none());
        assert_eq!(tracker.scan_count(), 0);
        assert!(matches!(
            tracker.scan(&page),
            Err(SpyError::RootUnavailable(RootSelector::Document))
        ));
    }

    #[test]
    fn test_events_after_unmount_are_ignored() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a", "b"]);
        page.scroll_to(20.0);
        tracker.update(TrackerEvent::Scroll, &page, 10).unwrap();

        let transition = tracker.update(TrackerEvent::Unmount, &page, 20).unwrap();
        assert_eq!(
            transition.effects,
            vec![Effect::Unsubscribe(RootSelector::Document)]
        );
        assert_eq!(tracker.phase(), TrackerPhase::TornDown);
        assert_eq!(tracker.next_deadline(), None);

        for event in [TrackerEvent::Tick, TrackerEvent::Scroll, TrackerEvent::Mount] {
            let transition = tracker.update(event, &page, 1_000).unwrap();
            assert_eq!(transition, Transition::default());
        }
        assert_eq!(tracker.scan_count(), 0);
    }

    #[test]
    fn test_scroll_before_mount_is_ignored() {
        let page = three_sections();
        let mut tracker = ViewportTracker::new(config(&["a"])).unwrap();

        let transition = tracker.update(TrackerEvent::Scroll, &page, 0).unwrap();
        assert_eq!(transition, Transition::default());
        assert_eq!(tracker.next_deadline(), None);
    }

    #[test]
    fn test_unchanged_scan_is_not_marked_changed() {
        let page = three_sections();
        let mut tracker = mounted(&page, &["a", "b"]);
        tracker.update(TrackerEvent::Tick, &page, 100).unwrap();

        tracker.update(TrackerEvent::Scroll, &page, 110).unwrap();
        let transition = tracker.update(TrackerEvent::Tick, &page, 210).unwrap();
        assert!(transition.published.is_some());
        assert!(!transition.changed);
    }
}

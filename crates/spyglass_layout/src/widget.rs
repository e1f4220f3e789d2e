//! Scrollspy widget
//!
//! Wires a [`ViewportTracker`] to a host that can both measure elements and
//! deliver scroll events (a [`Document`](crate::Document) in practice). The
//! widget owns the subscription: it executes the tracker's subscribe and
//! unsubscribe effects, forwards scroll notifications back into the tracker,
//! and calls the change callback whenever the published state differs.
//!
//! Time comes from an injected [`Clock`]. Hosts call [`Scrollspy::tick`] from
//! their frame loop (or after [`Scrollspy::next_deadline`]) to run due scans.
//!
//! ```rust
//! use std::rc::Rc;
//! use spyglass_core::{RootSelector, SpyConfig};
//! use spyglass_layout::{Document, Scrollspy};
//! use spyglass_runtime::VirtualClock;
//!
//! let doc = Document::new(800.0, 600.0);
//! doc.append(&RootSelector::Document, "intro", 700.0);
//! doc.append(&RootSelector::Document, "usage", 900.0);
//!
//! let clock = VirtualClock::new();
//! let config = SpyConfig::new("is-current").with_items(["intro", "usage"]);
//! let spy = Scrollspy::mount(doc.clone(), config, Rc::new(clock.clone())).unwrap();
//!
//! clock.advance(100);
//! spy.tick().unwrap();
//! assert_eq!(spy.state().current_index(), Some(0));
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spyglass_core::{RootSelector, SpyConfig, ViewState};
use spyglass_runtime::{
    Clock, Effect, RateLimiter, ScrollEventSource, SpyEnvironment, SpyError, TrackerEvent,
    TrackerPhase, ViewportTracker,
};

use crate::projection::{project, ChildDescriptor, ContainerDescriptor};

/// Called with the new state whenever it changes
pub type ChangeCallback = Rc<dyn Fn(&ViewState)>;

/// Host a scrollspy can mount on
pub trait SpyHost: SpyEnvironment + ScrollEventSource + 'static {}

impl<H: SpyEnvironment + ScrollEventSource + 'static> SpyHost for H {}

struct SpyShared<H: SpyHost> {
    host: H,
    clock: Rc<dyn Clock>,
    tracker: RefCell<ViewportTracker<H::Target>>,
    subscription: RefCell<Option<(RootSelector, H::Subscription)>>,
    on_change: RefCell<Option<ChangeCallback>>,
}

impl<H: SpyHost> SpyShared<H> {
    fn dispatch(self: &Rc<Self>, event: TrackerEvent) -> Result<bool, SpyError> {
        let now = self.clock.now_ms();
        let transition = self.tracker.borrow_mut().update(event, &self.host, now)?;

        for effect in transition.effects {
            self.apply(effect);
        }

        if transition.changed {
            if let Some(state) = &transition.published {
                let callback = self.on_change.borrow().clone();
                if let Some(callback) = callback {
                    callback(state);
                }
            }
        }
        Ok(transition.published.is_some())
    }

    fn apply(self: &Rc<Self>, effect: Effect) {
        match effect {
            Effect::Subscribe(root) => {
                let weak: Weak<Self> = Rc::downgrade(self);
                let callback = Rc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        if let Err(err) = shared.dispatch(TrackerEvent::Scroll) {
                            tracing::warn!("Scroll dispatch failed: {}", err);
                        }
                    }
                });
                match self.host.subscribe(&root, callback) {
                    Some(subscription) => {
                        tracing::debug!(root = %root, "scroll listener attached");
                        *self.subscription.borrow_mut() = Some((root, subscription));
                    }
                    None => tracing::warn!("Cannot attach scroll listener: root {} not found", root),
                }
            }
            Effect::Unsubscribe(root) => {
                let current = self.subscription.borrow_mut().take();
                match current {
                    Some((subscribed, subscription)) if subscribed == root => {
                        self.host.unsubscribe(&subscribed, subscription);
                        tracing::debug!(root = %root, "scroll listener detached");
                    }
                    other => *self.subscription.borrow_mut() = other,
                }
            }
        }
    }
}

/// A mounted scroll-spy
///
/// Dropping the widget unmounts it.
pub struct Scrollspy<H: SpyHost> {
    shared: Rc<SpyShared<H>>,
}

impl<H: SpyHost> Scrollspy<H> {
    /// Mount a spy with the default trailing throttle
    pub fn mount(host: H, config: SpyConfig, clock: Rc<dyn Clock>) -> Result<Self, SpyError> {
        let tracker = ViewportTracker::new(config)?;
        Self::mount_tracker(host, tracker, clock)
    }

    /// Mount a spy throttled by `limiter`
    pub fn mount_with_rate_limiter(
        host: H,
        config: SpyConfig,
        limiter: Box<dyn RateLimiter>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, SpyError> {
        let tracker = ViewportTracker::with_rate_limiter(config, limiter)?;
        Self::mount_tracker(host, tracker, clock)
    }

    fn mount_tracker(
        host: H,
        tracker: ViewportTracker<H::Target>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, SpyError> {
        let shared = Rc::new(SpyShared {
            host,
            clock,
            tracker: RefCell::new(tracker),
            subscription: RefCell::new(None),
            on_change: RefCell::new(None),
        });
        shared.dispatch(TrackerEvent::Mount)?;
        Ok(Self { shared })
    }

    /// Run due timers; returns whether a scan ran
    pub fn tick(&self) -> Result<bool, SpyError> {
        self.shared.dispatch(TrackerEvent::Tick)
    }

    /// Replace the configuration
    ///
    /// Targets are resolved again and a fresh settle scan is scheduled. A
    /// changed root moves the scroll listener.
    pub fn reconfigure(&self, config: SpyConfig) -> Result<(), SpyError> {
        if !self.is_mounted() {
            return Err(SpyError::NotMounted);
        }
        self.shared.dispatch(TrackerEvent::Configure(Box::new(config)))?;
        Ok(())
    }

    /// Detach from the host; later ticks and scrolls do nothing
    pub fn unmount(&self) {
        if let Err(err) = self.shared.dispatch(TrackerEvent::Unmount) {
            tracing::warn!("Unmount failed: {}", err);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.tracker.borrow().phase() == TrackerPhase::Mounted
    }

    /// Register the change callback, replacing any previous one
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&ViewState) + 'static,
    {
        *self.shared.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Last published state
    pub fn state(&self) -> ViewState {
        self.shared.tracker.borrow().state().clone()
    }

    pub fn config(&self) -> SpyConfig {
        self.shared.tracker.borrow().config().clone()
    }

    /// Earliest time a [`tick`](Self::tick) has work to do
    pub fn next_deadline(&self) -> Option<u64> {
        self.shared.tracker.borrow().next_deadline()
    }

    /// Number of scans run so far
    pub fn scan_count(&self) -> u64 {
        self.shared.tracker.borrow().scan_count()
    }

    /// Root the scroll listener is currently attached to
    pub fn subscribed_root(&self) -> Option<RootSelector> {
        self.shared
            .subscription
            .borrow()
            .as_ref()
            .map(|(root, _)| root.clone())
    }

    /// Host the spy is mounted on
    pub fn host(&self) -> &H {
        &self.shared.host
    }

    /// Project the current state onto `children`
    pub fn render(&self, children: &[Option<ChildDescriptor>]) -> ContainerDescriptor {
        let tracker = self.shared.tracker.borrow();
        project(children, tracker.state(), tracker.config())
    }
}

impl<H: SpyHost> Drop for Scrollspy<H> {
    fn drop(&mut self) {
        if self.shared.tracker.borrow().phase() != TrackerPhase::TornDown {
            self.unmount();
        }
    }
}

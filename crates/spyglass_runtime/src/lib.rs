//! Spyglass Runtime
//!
//! Drives scroll-spy scans over time:
//!
//! - **Clock**: [`SystemClock`] for hosts, [`VirtualClock`] for deterministic tests
//! - **Timers**: a slotmap-backed [`TimerQueue`] polled with the current time
//! - **Throttle**: the [`RateLimiter`] strategy and its trailing-edge default
//! - **Tracker**: the [`ViewportTracker`] state machine, which turns
//!   [`TrackerEvent`]s into published [`ViewState`]s and subscription [`Effect`]s
//!
//! The tracker is host-agnostic. Anything implementing [`SpyEnvironment`] can
//! feed it, from a real widget tree to a hand-built test page.
//!
//! [`ViewState`]: spyglass_core::ViewState

pub mod clock;
pub mod error;
pub mod throttle;
pub mod timer;
pub mod tracker;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use error::{Result, SpyError};
pub use throttle::{RateLimiter, ThrottleDecision, TrailingThrottle, Unthrottled};
pub use timer::{TimerId, TimerQueue};
pub use tracker::{
    resolve_targets, Effect, ScrollCallback, ScrollEventSource, SpyEnvironment, TrackerEvent,
    TrackerPhase, Transition, ViewportTracker,
};

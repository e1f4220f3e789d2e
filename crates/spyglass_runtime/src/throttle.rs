//! Rate limiting for scroll-driven scans
//!
//! Scroll events can arrive far faster than a scan is worth running. A
//! [`RateLimiter`] decides, per request, whether to scan now, schedule a
//! deferred scan, or fold the request into one already scheduled.
//!
//! ```text
//!   request          request ... request          deadline
//!      |  Schedule      |  Coalesced  |                |
//!    Idle ---------> Pending ------------------------> fire --> Idle
//! ```
//!
//! The deferred scan reads geometry when it fires, so the latest scroll
//! position always wins.

use spyglass_core::DEFAULT_THROTTLE_MS;

/// What to do with a scan request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Scan immediately
    RunNow,
    /// Schedule one scan at the given time
    Schedule { deadline_ms: u64 },
    /// A scan is already scheduled and will cover this request
    Coalesced,
}

/// Strategy deciding when scroll-driven scans run
pub trait RateLimiter {
    /// Register a scan request at `now_ms`
    fn request(&mut self, now_ms: u64) -> ThrottleDecision;

    /// A scheduled scan ran
    fn fire(&mut self, now_ms: u64);

    /// Forget any pending request
    fn reset(&mut self);

    /// Change the interval, if the strategy has one
    fn set_interval(&mut self, _interval_ms: u64) {}
}

/// Trailing-edge fixed-interval throttle
///
/// The first request of an idle period schedules a scan one interval later;
/// everything until then coalesces into it. An interval of zero scans
/// immediately.
#[derive(Debug, Clone)]
pub struct TrailingThrottle {
    interval_ms: u64,
    pending_deadline: Option<u64>,
    last_fired: Option<u64>,
}

impl Default for TrailingThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_MS)
    }
}

impl TrailingThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            pending_deadline: None,
            last_fired: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Deadline of the scheduled scan, if any
    pub fn pending_deadline(&self) -> Option<u64> {
        self.pending_deadline
    }

    /// When the last scheduled scan ran
    pub fn last_fired(&self) -> Option<u64> {
        self.last_fired
    }
}

impl RateLimiter for TrailingThrottle {
    fn request(&mut self, now_ms: u64) -> ThrottleDecision {
        if self.interval_ms == 0 {
            return ThrottleDecision::RunNow;
        }
        if self.pending_deadline.is_some() {
            return ThrottleDecision::Coalesced;
        }

        let deadline_ms = now_ms.saturating_add(self.interval_ms);
        self.pending_deadline = Some(deadline_ms);
        ThrottleDecision::Schedule { deadline_ms }
    }

    fn fire(&mut self, now_ms: u64) {
        self.pending_deadline = None;
        self.last_fired = Some(now_ms);
    }

    fn reset(&mut self) {
        self.pending_deadline = None;
    }

    fn set_interval(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }
}

/// No rate limiting: every request scans immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

impl RateLimiter for Unthrottled {
    fn request(&mut self, _now_ms: u64) -> ThrottleDecision {
        ThrottleDecision::RunNow
    }

    fn fire(&mut self, _now_ms: u64) {}

    fn reset(&mut self) {}
}

//! Redraw request batching.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Collapses bursts of redraw requests into at most one per interval.
#[derive(Debug, Clone)]
pub struct RedrawThrottle {
    interval: Duration,
    last_redraw: Option<Instant>,
    pending: bool,
}

impl RedrawThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_redraw: None,
            pending: false,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Mark that the scene changed.
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True when a redraw is pending and the interval has elapsed.
    pub fn should_redraw(&self) -> bool {
        self.should_redraw_at(Instant::now())
    }

    fn should_redraw_at(&self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        match self.last_redraw {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Consume the pending request if it is due. Returns true if the caller
    /// should redraw now.
    pub fn take(&mut self) -> bool {
        self.take_at(Instant::now())
    }

    fn take_at(&mut self, now: Instant) -> bool {
        if !self.should_redraw_at(now) {
            return false;
        }
        self.pending = false;
        self.last_redraw = Some(now);
        true
    }
}

impl Default for RedrawThrottle {
    fn default() -> Self {
        Self::from_millis(crate::config::REDRAW_INTERVAL_MS)
    }
}

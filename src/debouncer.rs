use std::time::{Duration, Instant};

/// A cancellable deadline that fires once after a period of inactivity.
///
/// Every `trigger_at` pushes the deadline out again, `reset` cancels it. The
/// caller polls `should_execute_at` from its event loop, so the debouncer
/// never owns a timer thread of its own.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// The duration to wait after the last event before triggering
    delay: Duration,
    /// When the last event occurred
    last_event: Option<Instant>,
    /// Whether we have a pending trigger
    pending: bool,
}

impl Debouncer {
    /// Create a new debouncer with the specified delay in milliseconds
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_event: None,
            pending: false,
        }
    }

    /// Register an event at `now`, replacing any pending deadline
    pub fn trigger_at(&mut self, now: Instant) {
        self.last_event = Some(now);
        self.pending = true;
    }

    /// Check if the quiet period has passed at `now`. Fires at most once per
    /// trigger.
    pub fn should_execute_at(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }

        if let Some(last) = self.last_event {
            if now.saturating_duration_since(last) >= self.delay {
                self.pending = false;
                self.last_event = None;
                return true;
            }
        }
        false
    }

    /// Time left before the action fires, `None` if nothing is pending
    pub fn time_remaining_at(&self, now: Instant) -> Option<Duration> {
        if !self.pending {
            return None;
        }

        self.last_event
            .map(|last| self.delay.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Reset the debouncer, canceling any pending action
    pub fn reset(&mut self) {
        self.last_event = None;
        self.pending = false;
    }
}

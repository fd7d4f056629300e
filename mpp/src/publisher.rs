//! Periodic snapshot timer.
//!
//! Fires when at least one period has elapsed since the last firing, then
//! rebases on the current instant. Missed periods are never replayed: after
//! a long stall the timer fires once and the next deadline is a full period
//! later.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Publisher {
    period: Option<Duration>,
    last_fired: Instant,
}

impl Publisher {
    /// `period_ms == 0` disables publishing. The first period counts from `now`.
    pub fn new(period_ms: u64, now: Instant) -> Self {
        Self {
            period: (period_ms > 0).then(|| Duration::from_millis(period_ms)),
            last_fired: now,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.period.is_some()
    }

    /// Earliest instant at which `poll` will fire.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.period.map(|period| self.last_fired + period)
    }

    /// Returns true, and rebases the timer, if the snapshot hook is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(period) = self.period else {
            return false;
        };
        if now.saturating_duration_since(self.last_fired) >= period {
            self.last_fired = now;
            true
        } else {
            false
        }
    }
}

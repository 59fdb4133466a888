use std::time::{Duration, Instant};

/// Periodic timer polled from the UI frame loop.
///
/// Nothing runs in the background; the owner calls [`IntervalTimer::fire`]
/// each frame and acts when it returns `true`.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Start if stopped. A running timer keeps its schedule.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
    }

    /// Stop, then start a full interval from `now`.
    pub fn restart(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns `true` once per elapsed interval and reschedules from `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next firing, for repaint scheduling.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

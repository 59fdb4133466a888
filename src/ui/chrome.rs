use std::time::{Duration, Instant};

use crate::timer::IntervalTimer;

/// Hides the controls after a spell without pointer activity. Only honoured
/// in fullscreen.
#[derive(Debug, Clone)]
pub struct AutoHide {
    timer: IntervalTimer,
    idle: bool,
}

impl AutoHide {
    pub fn new(delay: Duration, now: Instant) -> Self {
        let mut timer = IntervalTimer::new(delay);
        timer.start(now);
        Self { timer, idle: false }
    }

    /// Pointer moved: show the controls and restart the countdown.
    pub fn on_activity(&mut self, now: Instant) {
        self.idle = false;
        self.timer.restart(now);
    }

    pub fn tick(&mut self, now: Instant) {
        if self.timer.fire(now) {
            self.idle = true;
            self.timer.stop();
        }
    }

    pub fn controls_visible(&self, fullscreen: bool) -> bool {
        !(fullscreen && self.idle)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }
}

/// Start-up title card.
#[derive(Debug, Clone, Copy)]
pub struct Splash {
    until: Instant,
}

impl Splash {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            until: now + duration,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.until
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.is_visible(now)
            .then(|| self.until.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hides_only_in_fullscreen() {
        let t0 = Instant::now();
        let mut chrome = AutoHide::new(Duration::from_secs(3), t0);
        chrome.tick(t0 + Duration::from_secs(3));

        assert!(chrome.controls_visible(false));
        assert!(!chrome.controls_visible(true));
    }

    #[test]
    fn test_activity_restarts_countdown() {
        let t0 = Instant::now();
        let mut chrome = AutoHide::new(Duration::from_secs(3), t0);
        chrome.on_activity(t0 + Duration::from_secs(2));
        chrome.tick(t0 + Duration::from_secs(4));
        assert!(chrome.controls_visible(true));

        chrome.tick(t0 + Duration::from_secs(5));
        assert!(!chrome.controls_visible(true));

        chrome.on_activity(t0 + Duration::from_secs(6));
        assert!(chrome.controls_visible(true));
    }

    #[test]
    fn test_splash_expires() {
        let t0 = Instant::now();
        let splash = Splash::new(Duration::from_millis(2800), t0);
        assert!(splash.is_visible(t0 + Duration::from_millis(2799)));
        assert!(!splash.is_visible(t0 + Duration::from_millis(2800)));
        assert_eq!(splash.remaining(t0 + Duration::from_secs(3)), None);
    }
}

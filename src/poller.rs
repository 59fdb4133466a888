use std::time::{Duration, Instant};

use crate::engine::PlaybackEngine;
use crate::timer::IntervalTimer;

/// Playback progress ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub elapsed_ms: u64,
    pub total_ms: u64,
}

impl Progress {
    /// Elapsed share of the total, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total_ms == 0 {
            0.0
        } else {
            (self.elapsed_ms as f64 / self.total_ms as f64) as f32
        }
    }
}

/// Samples the engine's position on a fixed interval while playback runs.
#[derive(Debug, Clone)]
pub struct PositionPoller {
    timer: IntervalTimer,
}

impl PositionPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: IntervalTimer::new(interval),
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.timer.remaining(now)
    }

    /// Read the engine when the interval has elapsed. Nothing is emitted
    /// while the duration is still unknown.
    pub fn poll<E>(&mut self, now: Instant, engine: &E) -> Option<Progress>
    where
        E: PlaybackEngine + ?Sized,
    {
        if !self.timer.fire(now) {
            return None;
        }
        sample(engine)
    }
}

/// Current progress, or `None` while the duration is unknown.
pub fn sample<E: PlaybackEngine + ?Sized>(engine: &E) -> Option<Progress> {
    let total = engine.duration_ms();
    if total <= 0 {
        return None;
    }
    let elapsed = engine.position_ms().clamp(0, total);
    Some(Progress {
        elapsed_ms: elapsed as u64,
        total_ms: total as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use std::path::Path;

    struct Clock {
        position: i64,
        duration: i64,
    }

    impl PlaybackEngine for Clock {
        fn play(&mut self, _path: &Path) -> Result<(), PlayerError> {
            Ok(())
        }
        fn resume(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn seek(&mut self, offset_ms: u64) {
            self.position = offset_ms as i64;
        }
        fn position_ms(&self) -> i64 {
            self.position
        }
        fn duration_ms(&self) -> i64 {
            self.duration
        }
        fn set_volume_percent(&mut self, _percent: u8) {}
        fn is_finished(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unknown_duration_emits_nothing() {
        let t0 = Instant::now();
        let engine = Clock {
            position: 500,
            duration: -1,
        };
        let mut poller = PositionPoller::new(Duration::from_secs(1));
        poller.start(t0);
        assert_eq!(poller.poll(t0 + Duration::from_secs(1), &engine), None);
        assert_eq!(
            poller.poll(t0 + Duration::from_secs(2), &Clock { duration: 0, ..engine }),
            None
        );
    }

    #[test]
    fn test_emits_on_interval_only() {
        let t0 = Instant::now();
        let engine = Clock {
            position: 61_000,
            duration: 3_600_000,
        };
        let mut poller = PositionPoller::new(Duration::from_secs(1));
        poller.start(t0);

        assert_eq!(poller.poll(t0 + Duration::from_millis(400), &engine), None);
        assert_eq!(
            poller.poll(t0 + Duration::from_secs(1), &engine),
            Some(Progress {
                elapsed_ms: 61_000,
                total_ms: 3_600_000
            })
        );
        assert_eq!(poller.poll(t0 + Duration::from_millis(1200), &engine), None);
    }

    #[test]
    fn test_stopped_poller_is_silent() {
        let t0 = Instant::now();
        let engine = Clock {
            position: 0,
            duration: 1000,
        };
        let mut poller = PositionPoller::new(Duration::from_secs(1));
        assert_eq!(poller.poll(t0 + Duration::from_secs(5), &engine), None);
    }

    #[test]
    fn test_elapsed_clamped_to_total() {
        let engine = Clock {
            position: 12_000,
            duration: 10_000,
        };
        let progress = sample(&engine).unwrap();
        assert_eq!(progress.elapsed_ms, 10_000);
        assert_eq!(progress.fraction(), 1.0);
    }
}

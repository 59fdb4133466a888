use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Master clock for A/V sync, advanced by the audio output as samples play.
#[derive(Clone)]
pub struct AudioClock {
    /// Playback position in microseconds
    position_us: Arc<AtomicU64>,
    paused: Arc<AtomicBool>,
    /// Set on seek so the audio source drops stale samples
    clear_buffer: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl AudioClock {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            position_us: Arc::new(AtomicU64::new(0)),
            paused: Arc::new(AtomicBool::new(true)),
            clear_buffer: Arc::new(AtomicBool::new(false)),
            sample_rate,
            channels,
        }
    }

    pub fn position_ms(&self) -> u64 {
        self.position_us.load(Ordering::Relaxed) / 1000
    }

    /// Jump to `ms` and flag the audio buffer for clearing.
    pub fn set_position_ms(&self, ms: u64) {
        self.position_us.store(ms * 1000, Ordering::Relaxed);
        self.clear_buffer.store(true, Ordering::Relaxed);
    }

    /// Take the clear flag set by the last seek.
    pub fn should_clear_buffer(&self) -> bool {
        self.clear_buffer.swap(false, Ordering::Relaxed)
    }

    /// Advance by `samples` interleaved samples unless paused.
    pub fn advance_samples(&self, samples: u64) {
        if self.paused.load(Ordering::Relaxed) {
            return;
        }
        let per_second = self.sample_rate as u64 * self.channels.max(1) as u64;
        if per_second == 0 {
            return;
        }
        self.position_us
            .fetch_add(samples * 1_000_000 / per_second, Ordering::Relaxed);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

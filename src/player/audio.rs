use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

use super::ring::SampleRing;
use super::clock::AudioClock;

/// Number of samples played between clock updates.
const CLOCK_BATCH: u64 = 256;

/// Endless rodio source fed from the decoder's sample ring. Plays silence on
/// underrun and drives the [`AudioClock`].
///
/// Without an audio stream the ring is never fed, so the silence itself
/// advances the clock at the output's real-time pace.
pub struct ClockedSource {
    ring: Arc<SampleRing<f32>>,
    clock: AudioClock,
    pending: u64,
    has_audio: bool,
}

impl ClockedSource {
    pub fn new(ring: Arc<SampleRing<f32>>, clock: AudioClock, has_audio: bool) -> Self {
        Self {
            ring,
            clock,
            pending: 0,
            has_audio,
        }
    }
}

impl Iterator for ClockedSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.clock.should_clear_buffer() {
            self.ring.clear();
            self.pending = 0;
            return Some(0.0);
        }

        let sample = match self.ring.try_pop() {
            Some(sample) => sample,
            None if !self.has_audio => 0.0,
            None => return Some(0.0),
        };

        self.pending += 1;
        if self.pending == CLOCK_BATCH {
            self.clock.advance_samples(CLOCK_BATCH);
            self.pending = 0;
        }
        Some(sample)
    }
}

impl Source for ClockedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.clock.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

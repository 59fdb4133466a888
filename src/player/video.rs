use crossbeam_channel::Receiver;
use std::collections::VecDeque;

use super::decoder::DecodedVideoFrame;

/// Frames later than this behind the audio clock are dropped.
const DROP_THRESHOLD_MS: i64 = 20;
/// Frames up to this far ahead of the audio clock are shown.
const HOLD_THRESHOLD_MS: i64 = 20;
/// Tolerance before the seek target when looking for the first frame.
const SEEK_TOLERANCE_MS: i64 = 500;

/// Buffers decoded frames and releases them in step with the audio clock.
pub struct VideoFrameQueue {
    receiver: Receiver<DecodedVideoFrame>,
    buffer: VecDeque<DecodedVideoFrame>,
    current: Option<DecodedVideoFrame>,
    capacity: usize,
}

impl VideoFrameQueue {
    pub fn new(receiver: Receiver<DecodedVideoFrame>, capacity: usize) -> Self {
        Self {
            receiver,
            buffer: VecDeque::with_capacity(capacity),
            current: None,
            capacity,
        }
    }

    fn receive(&mut self) {
        while self.buffer.len() < self.capacity {
            match self.receiver.try_recv() {
                Ok(frame) => self.buffer.push_back(frame),
                Err(_) => break,
            }
        }
    }

    fn drop_before(&mut self, ms: i64) {
        while self.buffer.front().is_some_and(|f| f.pts_ms < ms) {
            self.buffer.pop_front();
        }
    }

    /// Frame to show at `clock_ms`. Returns a frame only when it changed.
    pub fn frame_at(&mut self, clock_ms: i64) -> Option<&DecodedVideoFrame> {
        self.receive();
        self.drop_before(clock_ms - DROP_THRESHOLD_MS);

        if self
            .buffer
            .front()
            .is_some_and(|f| f.pts_ms <= clock_ms + HOLD_THRESHOLD_MS)
        {
            self.current = self.buffer.pop_front();
            return self.current.as_ref();
        }
        None
    }

    /// First frame at or near `target_ms` after a seek.
    pub fn first_after_seek(&mut self, target_ms: i64) -> Option<&DecodedVideoFrame> {
        self.receive();
        self.drop_before(target_ms - SEEK_TOLERANCE_MS);

        if self.buffer.front().is_some() {
            self.current = self.buffer.pop_front();
            return self.current.as_ref();
        }
        None
    }

    /// Discard everything buffered or in flight.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.current = None;
        while self.receiver.try_recv().is_ok() {}
    }

    /// True once the decoder has nothing more queued for display.
    pub fn is_drained(&self) -> bool {
        self.buffer.is_empty() && self.receiver.is_empty()
    }
}

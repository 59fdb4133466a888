use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Sample ring shared between the decoder thread and the audio output.
/// Writers never block: once full, the oldest samples are overwritten.
pub struct SampleRing<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Copy> SampleRing<T> {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    pub fn push_slice(&self, items: &[T]) {
        let mut buf = self.inner.lock();
        // Only the newest `capacity` items can survive.
        let items = &items[items.len().saturating_sub(self.capacity)..];
        let overflow = (buf.len() + items.len()).saturating_sub(self.capacity);
        buf.drain(..overflow.min(buf.len()));
        buf.extend(items.iter().copied());
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_drops_oldest() {
        let ring = SampleRing::new(4);
        ring.push_slice(&[1, 2, 3]);
        ring.push_slice(&[4, 5]);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.try_pop(), Some(2));
    }

    #[test]
    fn test_oversized_slice_keeps_tail() {
        let ring = SampleRing::new(3);
        ring.push_slice(&[1, 2, 3, 4, 5, 6]);
        let drained: Vec<_> = std::iter::from_fn(|| ring.try_pop()).collect();
        assert_eq!(drained, [4, 5, 6]);
    }

    #[test]
    fn test_clear() {
        let ring = SampleRing::new(8);
        ring.push_slice(&[0.5f32; 6]);
        ring.clear();
        assert_eq!(ring.try_pop(), None);
    }
}

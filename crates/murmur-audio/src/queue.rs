use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::frame::AudioFrame;

struct Inner {
    frames: VecDeque<AudioFrame>,
    closed: bool,
}

/// Bounded FIFO hand-off between the capture callback and the
/// recognition worker.
///
/// `push` never blocks: when the queue is at capacity the oldest frame
/// is evicted and counted. `pop` blocks the worker up to a timeout so
/// it stays responsive to shutdown.
pub struct FrameQueue {
    inner: Mutex<Inner>,
    available: Condvar,
    capacity: usize,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame queue capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a frame, evicting the oldest if at capacity.
    /// Returns `false` once the queue has been closed.
    pub fn push(&self, frame: AudioFrame) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }
            if inner.frames.len() == self.capacity {
                inner.frames.pop_front();
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                // Rate-limited: this runs on the capture callback thread.
                if dropped == 1 || dropped % 64 == 0 {
                    warn!(target: "audio", dropped, "frame queue full, evicting oldest frame");
                }
            }
            inner.frames.push_back(frame);
        }
        self.available.notify_one();
        true
    }

    /// Dequeue the oldest frame, waiting up to `timeout`.
    /// Returns `None` on timeout, or once the queue is closed and empty.
    pub fn pop(&self, timeout: Duration) -> Option<AudioFrame> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if let Some(frame) = inner.frames.pop_front() {
                return Some(frame);
            }
            if inner.closed {
                return None;
            }
            if self.available.wait_until(&mut inner, deadline).timed_out() {
                return inner.frames.pop_front();
            }
        }
    }

    /// Close the queue: wakes blocked `pop` calls and makes later
    /// `push` calls no-ops. Idempotent.
    pub fn close(&self) {
        {
            let mut inner = self.inner.lock();
            inner.closed = true;
        }
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total frames evicted under backpressure since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    fn frame(tag: i16) -> AudioFrame {
        AudioFrame {
            samples: vec![tag; 4],
            timestamp: Instant::now(),
            sample_rate: 16_000,
            channels: 1,
        }
    }

    #[test]
    fn fifo_order_under_capacity() {
        let q = FrameQueue::new(8);
        for tag in 0..5 {
            assert!(q.push(frame(tag)));
        }
        for tag in 0..5 {
            let f = q.pop(Duration::from_millis(10)).unwrap();
            assert_eq!(f.samples[0], tag);
        }
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn drop_oldest_retains_newest() {
        // Capacity 2, push 5: exactly the 3 oldest are dropped and the
        // last 2 pushed are retained, in order.
        let q = FrameQueue::new(2);
        for tag in 0..5 {
            assert!(q.push(frame(tag)));
        }
        assert_eq!(q.len(), 2);
        assert_eq!(q.dropped(), 3);
        assert_eq!(q.pop(Duration::from_millis(10)).unwrap().samples[0], 3);
        assert_eq!(q.pop(Duration::from_millis(10)).unwrap().samples[0], 4);
    }

    #[test]
    fn pop_times_out_when_empty() {
        let q = FrameQueue::new(2);
        let start = Instant::now();
        assert!(q.pop(Duration::from_millis(20)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn push_after_close_is_rejected() {
        let q = FrameQueue::new(2);
        q.close();
        assert!(!q.push(frame(0)));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn close_drains_then_returns_none() {
        let q = FrameQueue::new(4);
        q.push(frame(1));
        q.push(frame(2));
        q.close();
        // Frames enqueued before close are still delivered.
        assert_eq!(q.pop(Duration::from_millis(10)).unwrap().samples[0], 1);
        assert_eq!(q.pop(Duration::from_millis(10)).unwrap().samples[0], 2);
        assert!(q.pop(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn close_wakes_blocked_pop() {
        let q = Arc::new(FrameQueue::new(2));
        let q2 = Arc::clone(&q);
        let handle = std::thread::spawn(move || q2.pop(Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        q.close();
        assert!(handle.join().unwrap().is_none());
        // The waiter returned on close, not on its 5s timeout.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn push_wakes_blocked_pop() {
        let q = Arc::new(FrameQueue::new(2));
        let q2 = Arc::clone(&q);
        let handle = std::thread::spawn(move || q2.pop(Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(50));
        q.push(frame(7));
        let got = handle.join().unwrap().unwrap();
        assert_eq!(got.samples[0], 7);
    }
}

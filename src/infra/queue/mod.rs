//! Bounded, interrupt-safe frame queue feeding received frames from the
//! controller interrupt into task context.
//!
//! The ring indices are the only state this crate mutates from both
//! interrupt and task context. Every update happens inside a
//! critical-section lock kept free of blocking calls, so the producer
//! side is safe to run at interrupt priority.
use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::{with_timeout, Duration};

use crate::error::QueueError;
use crate::transport::frame::Frame;

/// Number of frame slots in the receive queue. This bound is a hard
/// resource ceiling, not a tunable default.
pub const FRAME_QUEUE_DEPTH: usize = 64;

/// Ring storage and indices. Only ever touched under the critical section.
struct RingState<const N: usize> {
    slots: [Frame; N],
    head: usize,
    tail: usize,
    count: usize,
    dropped: u32,
    reader: WakerRegistration,
}

impl<const N: usize> RingState<N> {
    const fn new() -> Self {
        Self {
            slots: [Frame::EMPTY; N],
            head: 0,
            tail: 0,
            count: 0,
            dropped: 0,
            reader: WakerRegistration::new(),
        }
    }

    fn push(&mut self, frame: &Frame) -> Result<(), QueueError> {
        if self.count == N {
            return Err(QueueError::Exhausted);
        }
        self.slots[self.tail] = *frame;
        self.tail = (self.tail + 1) % N;
        self.count += 1;
        self.reader.wake();
        Ok(())
    }

    fn pop(&mut self) -> Option<Frame> {
        if self.count == 0 {
            return None;
        }
        let frame = self.slots[self.head];
        self.head = (self.head + 1) % N;
        self.count -= 1;
        Some(frame)
    }
}

/// Fixed-capacity FIFO of CAN frames with one interrupt producer and
/// task-side consumers.
///
/// Frames keep their arrival order. A push into a full queue fails and
/// leaves the stored frames untouched (newest frame loses). `pop` parks
/// at most one task at a time; the dispatcher's RX gate serializes
/// consumers above this queue, and `try_pop`/`len` are safe from any
/// task.
pub struct FrameQueue<const N: usize = FRAME_QUEUE_DEPTH> {
    ring: Mutex<CriticalSectionRawMutex, RefCell<RingState<N>>>,
}

impl<const N: usize> FrameQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(RingState::new())),
        }
    }

    /// Drop any stored frames and re-zero the indices and the overflow
    /// counter. Called once from `Dispatcher::init`, before the
    /// interrupt producer is armed.
    pub fn reset(&self) {
        self.ring.lock(|cell| {
            let mut ring = cell.borrow_mut();
            ring.head = 0;
            ring.tail = 0;
            ring.count = 0;
            ring.dropped = 0;
        });
    }

    /// Append a frame from task context.
    pub fn push(&self, frame: &Frame) -> Result<(), QueueError> {
        self.ring.lock(|cell| cell.borrow_mut().push(frame))
    }

    /// Append a frame from interrupt context. Never blocks; on overflow
    /// the offered frame is dropped and counted.
    pub fn push_from_isr(&self, frame: &Frame) -> Result<(), QueueError> {
        self.ring.lock(|cell| {
            let mut ring = cell.borrow_mut();
            ring.push(frame).map_err(|err| {
                ring.dropped = ring.dropped.saturating_add(1);
                err
            })
        })
    }

    /// Wait up to `timeout` for the next frame.
    pub async fn pop(&self, timeout: Duration) -> Result<Frame, QueueError> {
        with_timeout(timeout, self.recv())
            .await
            .map_err(|_| QueueError::Timeout)
    }

    async fn recv(&self) -> Frame {
        poll_fn(|cx| {
            self.ring.lock(|cell| {
                let mut ring = cell.borrow_mut();
                match ring.pop() {
                    Some(frame) => Poll::Ready(frame),
                    None => {
                        ring.reader.register(cx.waker());
                        Poll::Pending
                    }
                }
            })
        })
        .await
    }

    /// Remove and return the oldest frame, if any. Never blocks; this is
    /// the primitive the cyclic RX drain is built on.
    pub fn try_pop(&self) -> Option<Frame> {
        self.ring.lock(|cell| cell.borrow_mut().pop())
    }

    /// Copy the oldest frame without removing it.
    pub fn peek(&self) -> Result<Frame, QueueError> {
        self.ring.lock(|cell| {
            let ring = cell.borrow();
            if ring.count == 0 {
                Err(QueueError::Empty)
            } else {
                Ok(ring.slots[ring.head])
            }
        })
    }

    /// Number of frames currently stored.
    pub fn len(&self) -> usize {
        self.ring.lock(|cell| cell.borrow().count)
    }

    /// Checks whether the queue holds no frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of frames the interrupt producer had to drop because the
    /// queue was full.
    pub fn dropped(&self) -> u32 {
        self.ring.lock(|cell| cell.borrow().dropped)
    }
}

impl<const N: usize> Default for FrameQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

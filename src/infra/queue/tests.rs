//! Unit tests for ring ordering and the overflow policy. The blocking
//! pop path is covered by the integration tests.
use super::*;
use crate::transport::id::{FrameId, FrameKind};

fn frame(n: u32) -> Frame {
    let id = FrameId::compose(1, FrameKind::Data, n).unwrap();
    Frame::new(id, &n.to_le_bytes()[..4]).unwrap()
}

#[test]
/// Frames come back out in arrival order.
fn test_fifo_order() {
    let queue: FrameQueue = FrameQueue::new();
    for n in 0..10 {
        queue.push(&frame(n)).unwrap();
    }
    assert_eq!(queue.len(), 10);
    for n in 0..10 {
        assert_eq!(queue.try_pop().unwrap(), frame(n));
    }
    assert!(queue.is_empty());
}

#[test]
/// Filling the queue, a failing extra push leaves the contents intact.
fn test_push_on_full_fails_without_damage() {
    let queue: FrameQueue = FrameQueue::new();
    for n in 0..FRAME_QUEUE_DEPTH as u32 {
        queue.push(&frame(n)).unwrap();
    }
    assert_eq!(queue.push(&frame(999)), Err(QueueError::Exhausted));
    assert_eq!(queue.len(), FRAME_QUEUE_DEPTH);

    for n in 0..FRAME_QUEUE_DEPTH as u32 {
        assert_eq!(queue.try_pop().unwrap(), frame(n));
    }
}

#[test]
/// Only the interrupt-side push counts dropped frames.
fn test_overflow_counter() {
    let queue: FrameQueue = FrameQueue::new();
    for n in 0..FRAME_QUEUE_DEPTH as u32 {
        queue.push_from_isr(&frame(n)).unwrap();
    }
    assert_eq!(queue.push_from_isr(&frame(100)), Err(QueueError::Exhausted));
    assert_eq!(queue.push_from_isr(&frame(101)), Err(QueueError::Exhausted));
    assert_eq!(queue.dropped(), 2);

    let _ = queue.push(&frame(102));
    assert_eq!(queue.dropped(), 2);
}

#[test]
/// Peek copies the head without consuming it.
fn test_peek() {
    let queue: FrameQueue = FrameQueue::new();
    assert_eq!(queue.peek(), Err(QueueError::Empty));

    queue.push(&frame(7)).unwrap();
    assert_eq!(queue.peek().unwrap(), frame(7));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.try_pop().unwrap(), frame(7));
}

#[test]
/// The ring keeps FIFO order across wrap-around.
fn test_wrap_around() {
    let queue: FrameQueue<4> = FrameQueue::new();
    for n in 0..4 {
        queue.push(&frame(n)).unwrap();
    }
    assert_eq!(queue.try_pop().unwrap(), frame(0));
    assert_eq!(queue.try_pop().unwrap(), frame(1));
    queue.push(&frame(4)).unwrap();
    queue.push(&frame(5)).unwrap();

    for n in 2..6 {
        assert_eq!(queue.try_pop().unwrap(), frame(n));
    }
}

#[test]
/// Reset drops the contents and the overflow count.
fn test_reset() {
    let queue: FrameQueue<4> = FrameQueue::new();
    for n in 0..4 {
        queue.push(&frame(n)).unwrap();
    }
    let _ = queue.push_from_isr(&frame(9));
    assert_eq!(queue.dropped(), 1);

    queue.reset();
    assert!(queue.is_empty());
    assert_eq!(queue.dropped(), 0);
    assert_eq!(queue.try_pop(), None);
}

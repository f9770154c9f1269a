//! Blocking-pop behavior of the frame queue under real time.
mod helpers;

use helpers::data_frame;
use kestrel_can::error::QueueError;
use kestrel_can::infra::queue::FrameQueue;

use embassy_time::Duration;

#[tokio::test]
async fn test_pop_times_out_on_empty_queue() {
    let queue: FrameQueue = FrameQueue::new();
    let outcome = queue.pop(Duration::from_millis(20)).await;
    assert_eq!(outcome, Err(QueueError::Timeout));
}

#[tokio::test]
async fn test_pop_returns_stored_frame_immediately() {
    let queue: FrameQueue = FrameQueue::new();
    queue.push(&data_frame(2, 0x000050, &[7])).unwrap();

    let frame = queue.pop(Duration::from_millis(20)).await.unwrap();
    assert_eq!(frame.id.message(), 0x000050);
}

#[tokio::test]
async fn test_pop_wakes_on_isr_push() {
    let queue: FrameQueue = FrameQueue::new();

    let (frame, pushed) = tokio::join!(queue.pop(Duration::from_millis(500)), async {
        // Let the consumer park first.
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        queue.push_from_isr(&data_frame(2, 0x000051, &[8]))
    });

    pushed.unwrap();
    assert_eq!(frame.unwrap().id.message(), 0x000051);
}

//! Test doubles standing in for the generated per-signal layer during
//! integration tests.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kestrel_can::dispatch::traits::{CyclicSource, FrameSink};
use kestrel_can::dispatch::RateTier;
use kestrel_can::transport::frame::Frame;
use kestrel_can::transport::id::{FrameId, FrameKind};
use kestrel_can::transport::settings::{BusMode, BusSettings};
use kestrel_can::transport::timing::Bitrate;
use kestrel_can::transport::traits::bus_transport::BusTransport;

/// Default settings for a test node.
#[allow(dead_code)]
pub fn settings(device_id: u8, loopback: bool) -> BusSettings {
    BusSettings {
        device_id,
        bitrate: Bitrate::Kbit500,
        tx_pin: 12,
        rx_pin: 11,
        loopback,
        mode: BusMode::Continuous,
    }
}

/// Build an extended data frame from a device and message id.
#[allow(dead_code)]
pub fn data_frame(source: u8, message: u32, payload: &[u8]) -> Frame {
    let id = FrameId::compose(source, FrameKind::Data, message).unwrap();
    Frame::new(id, payload).unwrap()
}

/// Encode source that transmits one heartbeat frame per fast-tier pass
/// and records how many passes ran. Holding the counter in an `Arc`
/// lets the test observe the count while the dispatcher owns the
/// source.
#[allow(dead_code)]
pub struct HeartbeatSource {
    pub runs: Arc<AtomicUsize>,
    pub hold_ms: u64,
}

impl<B: BusTransport> CyclicSource<B> for HeartbeatSource {
    async fn run_tier<'a>(&'a mut self, tier: RateTier, bus: &'a mut B) {
        if tier != RateTier::Fast {
            return;
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.hold_ms > 0 {
            // Keep the TX gate occupied to provoke contention.
            embassy_time::Timer::after(embassy_time::Duration::from_millis(self.hold_ms)).await;
        }
        let frame = data_frame(3, 0x000777, &[0xBE, 0xA7]);
        let _ = bus.transmit(&frame).await;
    }
}

/// Sink recording every decoded frame. The store sits behind an `Arc`
/// so the test keeps a handle while the dispatcher owns the sink.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub frames: Arc<std::sync::Mutex<Vec<Frame>>>,
}

impl RecordingSink {
    #[allow(dead_code)]
    pub fn recorded(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }
}

impl FrameSink for RecordingSink {
    fn on_frame(&mut self, frame: &Frame) {
        self.frames.lock().unwrap().push(*frame);
    }
}

/// Sink that drops everything.
#[allow(dead_code)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_frame(&mut self, _frame: &Frame) {}
}

/// Source that never transmits.
#[allow(dead_code)]
pub struct NullSource;

impl<B: BusTransport> CyclicSource<B> for NullSource {
    async fn run_tier<'a>(&'a mut self, _tier: RateTier, _bus: &'a mut B) {}
}

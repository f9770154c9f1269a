//! Deterministic bus simulation for host-based testing without real
//! hardware.
//!
//! Replicates the inert-target fallback contract exactly: `init`
//! performs its internal setup and then reports `Unimplemented`,
//! `bus_status` is always `Ok`, and the receive path always reports a
//! frame pending. Upper layers must stay exercisable against this
//! transport.
use crate::error::TransportError;
use crate::infra::queue::{FrameQueue, FRAME_QUEUE_DEPTH};
use crate::transport::filter::{Acceptance, FilterBanks};
use crate::transport::frame::Frame;
use crate::transport::settings::BusSettings;
use crate::transport::traits::bus_transport::{BusStatus, BusTransport};

/// Transmissions retained for inspection; later frames are still
/// accepted but no longer recorded.
pub const SENT_LOG_DEPTH: usize = 32;

/// In-memory CAN bus reproducing the `BusTransport` contract.
///
/// Frames "arrive" either through [`inject`](Self::inject) (the far side
/// of the bus) or through loopback transmission; both run the acceptance
/// banks and the queue's interrupt-side push, so overflow and filtering
/// behave exactly as the hardware path does.
pub struct SimBus<'q, const N: usize = FRAME_QUEUE_DEPTH> {
    queue: &'q FrameQueue<N>,
    banks: FilterBanks,
    loopback: bool,
    sent: [Frame; SENT_LOG_DEPTH],
    sent_len: usize,
}

impl<'q, const N: usize> SimBus<'q, N> {
    /// Attach the simulation to the node's receive queue.
    pub fn new(queue: &'q FrameQueue<N>) -> Self {
        Self {
            queue,
            banks: FilterBanks::new(),
            loopback: false,
            sent: [Frame::EMPTY; SENT_LOG_DEPTH],
            sent_len: 0,
        }
    }

    /// Frames handed to `transmit` so far, oldest first.
    pub fn sent(&self) -> &[Frame] {
        &self.sent[..self.sent_len.min(SENT_LOG_DEPTH)]
    }

    /// Simulate a frame arriving from another node.
    ///
    /// Returns whether the frame passed the acceptance banks and fit
    /// into the queue.
    pub fn inject(&self, frame: &Frame) -> bool {
        if !self.banks.accepts(frame) {
            return false;
        }
        self.queue.push_from_isr(frame).is_ok()
    }

    fn record(&mut self, frame: &Frame) {
        if self.sent_len < SENT_LOG_DEPTH {
            self.sent[self.sent_len] = *frame;
        }
        self.sent_len += 1;
    }
}

impl<'q, const N: usize> BusTransport for SimBus<'q, N> {
    fn init(&mut self, settings: &BusSettings) -> Result<(), TransportError> {
        self.banks.reset_to_allow_all();
        self.loopback = settings.loopback;
        self.sent_len = 0;
        // Fallback contract: the caller learns the bus is inert but may
        // continue against the simulated one.
        Err(TransportError::Unimplemented)
    }

    fn add_filter(&mut self, rule: &Acceptance) -> Result<(), TransportError> {
        self.banks.install(*rule).map(|_| ())
    }

    fn bus_status(&self) -> BusStatus {
        BusStatus::Ok
    }

    fn rx_pending(&self) -> bool {
        true
    }

    async fn transmit<'a>(&'a mut self, frame: &'a Frame) -> Result<(), TransportError> {
        if frame.dlc > 8 {
            return Err(TransportError::InvalidArgs);
        }
        self.record(frame);
        if self.loopback && self.banks.accepts(frame) {
            // Queue overflow drops the frame, as the interrupt path would.
            let _ = self.queue.push_from_isr(frame);
        }
        Ok(())
    }
}

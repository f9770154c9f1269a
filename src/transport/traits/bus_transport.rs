//! Minimal abstraction over a CAN controller. Allows the core to drive
//! real register-level hardware or a deterministic host simulation.
use crate::error::TransportError;
use crate::transport::filter::Acceptance;
use crate::transport::frame::Frame;
use crate::transport::settings::BusSettings;
use futures_util::Future;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Coarse controller health derived from its error counters.
pub enum BusStatus {
    /// Error counters below the warning threshold.
    Ok,
    /// Warning or error-passive level reached; the controller still
    /// participates in traffic.
    Error,
    /// The controller disengaged itself after repeated failures. It
    /// re-joins on its own once the bus recovers; this layer only
    /// reports the state.
    Off,
}

/// Contract to configure a CAN controller and move frames through it.
///
/// The receive path is not part of this trait: implementations feed
/// arriving frames into the frame queue handed to them at construction.
pub trait BusTransport {
    /// Program bit timing, mode flags, and the boot-time allow-all
    /// filter, then start the controller and arm its interrupts.
    ///
    /// A controller that never acknowledges the start handshake is a
    /// fatal `Internal` error. A stub target reports `Unimplemented`;
    /// upper layers stay functional over an inert bus.
    fn init(&mut self, settings: &BusSettings) -> Result<(), TransportError>;

    /// Program the next free filter bank. The first call after `init`
    /// replaces the allow-all bank instead of consuming a new one.
    fn add_filter(&mut self, rule: &Acceptance) -> Result<(), TransportError>;

    /// Current controller health.
    fn bus_status(&self) -> BusStatus;

    /// Whether a received frame is waiting in a hardware FIFO.
    fn rx_pending(&self) -> bool;

    /// Hand a frame to a transmit mailbox, waiting a bounded time for
    /// one to free up. Returns once hardware accepts the frame;
    /// delivery and arbitration remain bus concerns.
    fn transmit<'a>(
        &'a mut self,
        frame: &'a Frame,
    ) -> impl Future<Output = Result<(), TransportError>> + 'a;
}

//! Immutable per-node bus configuration, constructed once by the board
//! layer and consumed by `Dispatcher::init`.
use crate::transport::timing::Bitrate;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Transmission policy of the controller.
pub enum BusMode {
    /// Hardware retransmits automatically until a frame wins arbitration
    /// and is acknowledged.
    Continuous,
    /// Each frame is attempted exactly once.
    OneShot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Start-up configuration of one node's bus attachment.
///
/// Pin numbers are opaque to this core: multiplexing them onto the
/// transceiver is board-layer work. The core only rejects the obviously
/// inconsistent case of both roles on one pin.
pub struct BusSettings {
    /// This node's identity on the network.
    pub device_id: u8,
    /// Shared bus bit rate.
    pub bitrate: Bitrate,
    /// Transceiver TX pin.
    pub tx_pin: u8,
    /// Transceiver RX pin.
    pub rx_pin: u8,
    /// Connect TX to RX inside the controller (self-test and host runs).
    pub loopback: bool,
    /// Retransmission policy.
    pub mode: BusMode,
}

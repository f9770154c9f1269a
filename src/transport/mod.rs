//! CAN transport layer: frame and identifier model, bit-timing table,
//! acceptance filtering, the bus capability trait, and its hardware and
//! simulation implementations.
//!
//! ## Transport timing constants
//!
//! These constants bound the only waits the transport layer performs.
//! Every blocking operation in this crate is timeout-bounded; a timeout
//! is reported to the caller, never retried here.

pub mod filter;
pub mod frame;
pub mod hw;
pub mod id;
pub mod settings;
pub mod sim;
pub mod timing;
pub mod traits;

/// Number of acceptance filter banks the controller provides.
///
/// Bank 0 is programmed allow-all at start-up and is the first bank
/// replaced when application filters are installed.
pub const FILTER_BANK_COUNT: usize = 14;

/// Number of hardware transmit mailboxes.
///
/// Several frames may be queued for arbitration simultaneously; the bus
/// orders them by numeric identifier, not by submission order.
pub const TX_MAILBOX_COUNT: usize = 3;

/// Bounded wait for a free transmit mailbox (ms).
///
/// At the slowest supported rate (125 kbit/s) a worst-case frame lasts
/// roughly 1 ms on the wire; with arbitration losses and hardware
/// retransmission a mailbox normally frees well inside 20 ms. A 100 ms
/// ceiling keeps a dead or saturated bus from stalling callers while
/// staying far from false timeouts.
pub const TX_MAILBOX_TIMEOUT_MS: u32 = 100;

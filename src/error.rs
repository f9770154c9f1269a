//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction,
//! queue exhaustion, controller configuration, dispatch-state violations).
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while building identifiers or frames.
pub enum FrameError {
    /// The source device id does not fit the 4-bit field.
    #[error("source id out of range")]
    SourceOutOfRange,
    /// The message id does not fit the 24-bit field.
    #[error("message id out of range")]
    MessageOutOfRange,
    /// More than eight payload bytes were supplied.
    #[error("payload exceeds eight bytes")]
    PayloadTooLong,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised by the bounded frame queue.
pub enum QueueError {
    /// The queue is full; the offered frame was not stored.
    #[error("queue capacity exhausted")]
    Exhausted,
    /// No frame is stored.
    #[error("queue empty")]
    Empty,
    /// No frame arrived within the allotted wait.
    #[error("timed out waiting for a frame")]
    Timeout,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors reported by a bus transport implementation.
pub enum TransportError {
    /// A parameter is out of range or inconsistent with the settings.
    #[error("invalid transport arguments")]
    InvalidArgs,
    /// The controller failed to acknowledge a configuration step.
    /// Fatal: the bus never leaves reset.
    #[error("controller configuration failed")]
    Internal,
    /// Every filter bank is already programmed.
    #[error("filter banks exhausted")]
    Exhausted,
    /// The bounded wait for a free transmit mailbox expired.
    #[error("timed out waiting for a mailbox")]
    Timeout,
    /// The transport is a stub on this target; the bus stays inert.
    #[error("transport not implemented on this target")]
    Unimplemented,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors surfaced by the dispatcher API.
pub enum DispatchError {
    /// Operation attempted before `init` completed.
    #[error("dispatcher not initialized")]
    Uninitialized,
    /// A parameter is out of range (device id, message id, pin roles).
    #[error("invalid dispatcher arguments")]
    InvalidArgs,
    /// No received frame is pending.
    #[error("no frame pending")]
    Empty,
    /// Every watchdog slot is occupied.
    #[error("watchdog slots exhausted")]
    Exhausted,
    /// Error propagated from the bus transport.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

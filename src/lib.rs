//! `kestrel-can` library: the CAN-bus communication core shared by every
//! node of the vehicle control network, in a `no_std` environment. The
//! crate exposes the infrastructure primitives (bounded frame queue), the
//! transport layer (frames, identifiers, bit timing, acceptance filters,
//! hardware and simulation buses), and the application dispatcher with its
//! periodic-message watchdogs.
#![no_std]
//==================================================================================
/// Application dispatcher: device identity, cyclic rate tiers, and
/// staleness watchdogs for expected periodic messages.
pub mod dispatch;
/// Domain and low-level errors (frame construction, queue access,
/// transport configuration, dispatch-state violations).
pub mod error;
/// Infrastructure primitives shared by the transport and dispatch layers.
pub mod infra;
/// CAN transport layer: frame and identifier model, bit-timing table,
/// acceptance filtering, and the bus implementations.
pub mod transport;
//==================================================================================

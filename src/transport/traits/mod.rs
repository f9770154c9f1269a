//! Capability traits decoupling the dispatcher from the bus hardware.
pub mod bus_transport;

//! Infrastructure primitives shared by the transport and dispatch layers.
pub mod queue;

//! Boundary to the generated per-signal encode/decode layer.
//!
//! The code generator owns every message-id-to-signal mapping; this core
//! only sees the two capabilities below, injected at dispatcher
//! construction.
use crate::dispatch::RateTier;
use crate::transport::frame::Frame;
use crate::transport::traits::bus_transport::BusTransport;
use futures_util::Future;

/// Cyclic transmit work of one rate tier: encode the tier's signals and
/// hand the resulting frames to the bus.
pub trait CyclicSource<B: BusTransport> {
    /// Run the encode-and-transmit pass for `tier`.
    ///
    /// Per-frame transmit errors are the implementation's to handle; the
    /// dispatcher neither retries nor escalates them.
    fn run_tier<'a>(
        &'a mut self,
        tier: RateTier,
        bus: &'a mut B,
    ) -> impl Future<Output = ()> + 'a;
}

/// Receive-side decode hook: one call per drained frame.
pub trait FrameSink {
    /// Decode `frame` and fan it out to the owning subsystem.
    fn on_frame(&mut self, frame: &Frame);
}

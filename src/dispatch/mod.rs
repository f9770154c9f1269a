//! Application dispatcher: owns the device identity, the bus transport,
//! and the cyclic transmit/receive machinery other subsystems call.
//!
//! All cyclic entry points take `&self` so any number of periodic tasks
//! may share one dispatcher; the TX tiers and the RX drain are each
//! serialized behind an async gate. Gate acquisition is bounded: a
//! contended cycle is skipped silently and the next periodic invocation
//! retries, so the scheduler never stalls on this layer.
pub mod traits;
pub mod watchdog;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Instant};

use crate::error::{DispatchError, TransportError};
use crate::infra::queue::{FrameQueue, FRAME_QUEUE_DEPTH};
use crate::transport::filter::Acceptance;
use crate::transport::frame::Frame;
use crate::transport::id::{FrameId, FrameKind};
use crate::transport::settings::BusSettings;
use crate::transport::traits::bus_transport::{BusStatus, BusTransport};

use traits::{CyclicSource, FrameSink};
use watchdog::WatchdogRegistry;

/// Number of device identities on the network. Mirrors the generated
/// network description; the 4-bit source field of the identifier caps
/// it. This core only range-checks against it.
pub const DEVICE_COUNT: u8 = 16;

/// Bounded wait for a cyclic gate (ms).
///
/// Long enough for a competing tier to finish its encode pass, short
/// enough that a skipped cycle costs less than a period of the fastest
/// tier.
pub const CYCLIC_GATE_TIMEOUT_MS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Periodic rate tiers the cyclic work is multiplexed across. `All`
/// runs at the base scheduler rate; the others at their slower periods.
pub enum RateTier {
    All,
    Fast,
    Medium,
    Slow,
}

/// Transmit-side state serialized behind the TX gate.
struct TxLane<B, S> {
    bus: B,
    source: S,
}

/// Per-node dispatcher owning the bus attachment.
///
/// Generic over the transport and the two codegen-boundary hooks so one
/// binary can drive real hardware while host tests drive the
/// simulation.
pub struct Dispatcher<'q, B, S, K, const N: usize = FRAME_QUEUE_DEPTH>
where
    B: BusTransport,
    S: CyclicSource<B>,
    K: FrameSink,
{
    device_id: u8,
    initialized: bool,
    queue: &'q FrameQueue<N>,
    watchdogs: WatchdogRegistry,
    tx_lane: Mutex<CriticalSectionRawMutex, TxLane<B, S>>,
    rx_lane: Mutex<CriticalSectionRawMutex, K>,
}

impl<'q, B, S, K, const N: usize> Dispatcher<'q, B, S, K, N>
where
    B: BusTransport,
    S: CyclicSource<B>,
    K: FrameSink,
{
    /// Assemble the dispatcher. No hardware is touched and no operation
    /// is permitted until [`init`](Self::init) succeeds.
    pub fn new(queue: &'q FrameQueue<N>, bus: B, source: S, sink: K) -> Self {
        Self {
            device_id: 0,
            initialized: false,
            queue,
            watchdogs: WatchdogRegistry::new(),
            tx_lane: Mutex::new(TxLane { bus, source }),
            rx_lane: Mutex::new(sink),
        }
    }

    /// Validate the settings, reset the queue and the watchdog pool, and
    /// start the bus transport.
    ///
    /// A transport that reports `Unimplemented` leaves the node
    /// functional over an inert bus (host builds); any other transport
    /// failure is fatal and propagates. Success is terminal: there is no
    /// re-init or teardown path.
    pub fn init(&mut self, settings: &BusSettings) -> Result<(), DispatchError> {
        if settings.device_id >= DEVICE_COUNT {
            return Err(DispatchError::InvalidArgs);
        }
        if settings.tx_pin == settings.rx_pin {
            return Err(DispatchError::InvalidArgs);
        }

        self.queue.reset();
        self.watchdogs.clear();

        match self.tx_lane.get_mut().bus.init(settings) {
            Ok(()) => {}
            Err(TransportError::Unimplemented) => {
                #[cfg(feature = "defmt")]
                defmt::info!("bus transport inert on this target, continuing");
            }
            Err(err) => return Err(err.into()),
        }

        self.device_id = settings.device_id;
        self.initialized = true;
        Ok(())
    }

    /// This node's identity on the network.
    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    fn ensure_ready(&self) -> Result<(), DispatchError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DispatchError::Uninitialized)
        }
    }

    /// Accept one incoming message id: build a rule that matches exactly
    /// the 24-bit message field, any source device, any kind, and
    /// program it into the next filter bank.
    pub async fn add_filter_in(&self, message_id: u32) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        let rule =
            Acceptance::for_message(message_id).map_err(|_| DispatchError::InvalidArgs)?;
        let mut lane = self.tx_lane.lock().await;
        lane.bus.add_filter(&rule)?;
        Ok(())
    }

    /// Hand a prepared frame to the bus.
    pub async fn transmit(&self, frame: &Frame) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        let mut lane = self.tx_lane.lock().await;
        lane.bus.transmit(frame).await?;
        Ok(())
    }

    /// Compose an identifier from this node's identity and transmit the
    /// payload as a data frame.
    pub async fn transmit_message(
        &self,
        message_id: u32,
        data: &[u8],
    ) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        let id = FrameId::compose(self.device_id, FrameKind::Data, message_id)
            .map_err(|_| DispatchError::InvalidArgs)?;
        let frame = Frame::new(id, data).map_err(|_| DispatchError::InvalidArgs)?;
        let mut lane = self.tx_lane.lock().await;
        lane.bus.transmit(&frame).await?;
        Ok(())
    }

    /// Pop the oldest received frame, if any, marking its watchdog entry
    /// received.
    pub fn receive(&self) -> Result<Frame, DispatchError> {
        self.ensure_ready()?;
        match self.queue.try_pop() {
            Some(frame) => {
                self.watchdogs.note_received(frame.id.message());
                Ok(frame)
            }
            None => Err(DispatchError::Empty),
        }
    }

    /// Current controller health.
    pub async fn bus_status(&self) -> Result<BusStatus, DispatchError> {
        self.ensure_ready()?;
        let lane = self.tx_lane.lock().await;
        Ok(lane.bus.bus_status())
    }

    /// Start watching a periodic receive message on `tier`.
    pub fn watch_rx(
        &self,
        message_id: u32,
        tier: RateTier,
        timeout: Duration,
    ) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        self.watchdogs
            .register(message_id, tier, timeout, Instant::now())
    }

    /// Stale flag of a watched message; `None` when the id is not
    /// watched.
    pub fn message_stale(&self, message_id: u32) -> Option<bool> {
        self.watchdogs.is_stale(message_id)
    }

    /// Run the every-cycle transmit tier.
    pub async fn run_tx_all(&self) -> Result<(), DispatchError> {
        self.run_tx(RateTier::All).await
    }

    /// Run the fast transmit tier.
    pub async fn run_tx_fast(&self) -> Result<(), DispatchError> {
        self.run_tx(RateTier::Fast).await
    }

    /// Run the medium transmit tier.
    pub async fn run_tx_medium(&self) -> Result<(), DispatchError> {
        self.run_tx(RateTier::Medium).await
    }

    /// Run the slow transmit tier.
    pub async fn run_tx_slow(&self) -> Result<(), DispatchError> {
        self.run_tx(RateTier::Slow).await
    }

    async fn run_tx(&self, tier: RateTier) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        let gate = Duration::from_millis(u64::from(CYCLIC_GATE_TIMEOUT_MS));
        let Ok(mut lane) = with_timeout(gate, self.tx_lane.lock()).await else {
            // Contended gate: skip this cycle, the next invocation retries.
            #[cfg(feature = "defmt")]
            defmt::trace!("tx tier {} skipped, gate busy", tier);
            return Ok(());
        };
        let TxLane { bus, source } = &mut *lane;
        source.run_tier(tier, bus).await;
        self.watchdogs.check_tier(tier, Instant::now());
        Ok(())
    }

    /// Drain the receive queue, handing each frame to the decode hook
    /// and marking its watchdog entry received.
    pub async fn run_rx_all(&self) -> Result<(), DispatchError> {
        self.ensure_ready()?;
        let gate = Duration::from_millis(u64::from(CYCLIC_GATE_TIMEOUT_MS));
        let Ok(mut sink) = with_timeout(gate, self.rx_lane.lock()).await else {
            #[cfg(feature = "defmt")]
            defmt::trace!("rx drain skipped, gate busy");
            return Ok(());
        };
        while let Some(frame) = self.queue.try_pop() {
            self.watchdogs.note_received(frame.id.message());
            sink.on_frame(&frame);
        }
        Ok(())
    }
}

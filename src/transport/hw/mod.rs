//! Register-level controller driver: bit-timing programming, filter
//! banks, transmit mailboxes, and the interrupt-side receive path.
//!
//! The crate wires no interrupt vector itself. The board layer owns the
//! vector table and calls the [`IrqHandle`] routines from its handlers;
//! the handle carries the injected queue reference, the one deliberate
//! non-owning back-reference in the design.
pub mod registers;

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Instant};

use crate::error::TransportError;
use crate::infra::queue::{FrameQueue, FRAME_QUEUE_DEPTH};
use crate::transport::filter::{Acceptance, FilterBanks};
use crate::transport::frame::Frame;
use crate::transport::id::FrameId;
use crate::transport::settings::{BusMode, BusSettings};
use crate::transport::traits::bus_transport::{BusStatus, BusTransport};
use crate::transport::{FILTER_BANK_COUNT, TX_MAILBOX_TIMEOUT_MS};

use registers::{btr, esr, fmr, ier, mcr, msr, rfr, tir, tsr, RegisterBlock};

/// Ownership marker for one controller instance.
///
/// # Safety
///
/// Implementors must guarantee that the type represents exclusive
/// ownership of the controller and that `REGISTERS` points at its
/// register block for as long as the marker exists.
pub unsafe trait Instance {
    /// Pointer to the instance's register block.
    const REGISTERS: *mut RegisterBlock;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Receive FIFO selector for the interrupt routines.
pub enum RxFifo {
    Fifo0 = 0,
    Fifo1 = 1,
}

/// State shared between the driver and its interrupt handle.
///
/// Lives wherever the board layer can reach it from interrupt context,
/// typically a `static`.
pub struct IrqShared {
    tx_ready: Signal<CriticalSectionRawMutex, ()>,
    error_events: AtomicU32,
}

impl IrqShared {
    pub const fn new() -> Self {
        Self {
            tx_ready: Signal::new(),
            error_events: AtomicU32::new(0),
        }
    }

    /// Number of error/status interrupts taken since start.
    pub fn error_events(&self) -> u32 {
        self.error_events.load(Ordering::Relaxed)
    }
}

impl Default for IrqShared {
    fn default() -> Self {
        Self::new()
    }
}

// The init-mode handshake completes within a handful of bus bit times;
// this bound is orders of magnitude above that and only exists so a dead
// controller surfaces as an error instead of a hang.
const INIT_ACK_SPIN_LIMIT: u32 = 100_000;

fn wait_handshake(mut ready: impl FnMut() -> bool) -> Result<(), TransportError> {
    for _ in 0..INIT_ACK_SPIN_LIMIT {
        if ready() {
            return Ok(());
        }
    }
    Err(TransportError::Internal)
}

/// Driver for one controller instance.
pub struct HardwareBus<'q, I: Instance, const N: usize = FRAME_QUEUE_DEPTH> {
    queue: &'q FrameQueue<N>,
    shared: &'q IrqShared,
    banks: FilterBanks,
    _instance: PhantomData<I>,
}

impl<'q, I: Instance, const N: usize> HardwareBus<'q, I, N> {
    /// Bind the driver to its receive queue and interrupt-shared state.
    /// Touches no hardware until [`BusTransport::init`].
    pub fn new(queue: &'q FrameQueue<N>, shared: &'q IrqShared) -> Self {
        Self {
            queue,
            shared,
            banks: FilterBanks::new(),
            _instance: PhantomData,
        }
    }

    /// Handle for the board layer's interrupt routines.
    pub fn irq_handle(&self) -> IrqHandle<'q, I, N> {
        IrqHandle {
            queue: self.queue,
            shared: self.shared,
            _instance: PhantomData,
        }
    }

    /// Transmit and receive error counters (TEC, REC).
    pub fn error_counters(&self) -> (u8, u8) {
        let status = self.regs().esr.read();
        (
            ((status >> esr::TEC_SHIFT) & 0xFF) as u8,
            ((status >> esr::REC_SHIFT) & 0xFF) as u8,
        )
    }

    fn regs(&self) -> &RegisterBlock {
        unsafe { &*I::REGISTERS }
    }

    fn free_mailbox(&self) -> Option<usize> {
        let status = self.regs().tsr.read();
        if status & tsr::TME0 != 0 {
            Some(0)
        } else if status & tsr::TME1 != 0 {
            Some(1)
        } else if status & tsr::TME2 != 0 {
            Some(2)
        } else {
            None
        }
    }

    fn write_mailbox(&self, index: usize, frame: &Frame) {
        let mailbox = &self.regs().tx[index];
        let p = &frame.payload;
        mailbox.tdtr.write(u32::from(frame.dlc));
        mailbox.tdlr.write(u32::from_le_bytes([p[0], p[1], p[2], p[3]]));
        mailbox.tdhr.write(u32::from_le_bytes([p[4], p[5], p[6], p[7]]));
        // Writing TXRQ hands the mailbox to the controller.
        mailbox
            .tir
            .write(rule_word(frame.id.raw(), frame.extended) | tir::TXRQ);
    }
}

/// Identifier/mask encoding of the TIR and filter registers.
fn rule_word(value: u32, extended: bool) -> u32 {
    if extended {
        (value << tir::EXID_SHIFT) | tir::IDE
    } else {
        (value & 0x7FF) << tir::STID_SHIFT
    }
}

impl<'q, I: Instance, const N: usize> BusTransport for HardwareBus<'q, I, N> {
    fn init(&mut self, settings: &BusSettings) -> Result<(), TransportError> {
        if settings.tx_pin == settings.rx_pin {
            return Err(TransportError::InvalidArgs);
        }
        let timing = settings.bitrate.timing();
        timing.check()?;
        self.banks.reset_to_allow_all();
        let can = self.regs();

        // Wake from sleep and request initialization mode.
        can.mcr.modify(|r| (r & !mcr::SLEEP) | mcr::INRQ);
        wait_handshake(|| can.msr.read() & msr::INAK != 0)?;

        // Bit timing; the resynchronization jump width stays at one
        // quantum (field value zero).
        let mut btr_value = u32::from(timing.prescaler - 1)
            | (u32::from(timing.bs1 - 1) << btr::TS1_SHIFT)
            | (u32::from(timing.bs2 - 1) << btr::TS2_SHIFT);
        if settings.loopback {
            btr_value |= btr::LBKM;
        }
        can.btr.write(btr_value);

        // Boot-time allow-all filter in bank 0. All banks run in 32-bit
        // mask mode and feed FIFO 0; FIFO 1 stays armed for future
        // routing.
        can.fmr.modify(|r| r | fmr::FINIT);
        can.fa1r.write(0);
        can.fm1r.write(0);
        can.fs1r.write((1u32 << FILTER_BANK_COUNT) - 1);
        can.ffa1r.write(0);
        can.fbank[0].fr1.write(0);
        can.fbank[0].fr2.write(0);
        can.fa1r.write(1);
        can.fmr.modify(|r| r & !fmr::FINIT);

        // Arm the four interrupt sources: mailbox empty, both FIFOs,
        // and the error/status line.
        can.ier.write(
            ier::TMEIE
                | ier::FMPIE0
                | ier::FMPIE1
                | ier::EWGIE
                | ier::EPVIE
                | ier::BOFIE
                | ier::ERRIE,
        );

        // Leave initialization mode and synchronize to the bus. ABOM
        // keeps bus-off recovery automatic; NART selects one-shot.
        let mode_bit = match settings.mode {
            BusMode::Continuous => 0,
            BusMode::OneShot => mcr::NART,
        };
        can.mcr
            .modify(|r| (r & !(mcr::INRQ | mcr::SLEEP)) | mcr::ABOM | mode_bit);
        wait_handshake(|| can.msr.read() & msr::INAK == 0)?;

        // All mailboxes start free.
        self.shared.tx_ready.reset();
        self.shared.tx_ready.signal(());

        #[cfg(feature = "defmt")]
        defmt::info!(
            "can controller started at {} bit/s",
            settings.bitrate.bits_per_second()
        );
        Ok(())
    }

    fn add_filter(&mut self, rule: &Acceptance) -> Result<(), TransportError> {
        let bank = self.banks.install(*rule)?;
        let can = self.regs();
        let filter_word = rule_word(rule.filter, rule.extended);
        // A trivial mask compares nothing, including the id format bit.
        let mask_word = if rule.mask == 0 {
            0
        } else {
            rule_word(rule.mask, rule.extended)
        };

        can.fmr.modify(|r| r | fmr::FINIT);
        can.fa1r.modify(|r| r & !(1 << bank));
        can.fbank[bank].fr1.write(filter_word);
        can.fbank[bank].fr2.write(mask_word);
        can.fa1r.modify(|r| r | (1 << bank));
        can.fmr.modify(|r| r & !fmr::FINIT);
        Ok(())
    }

    fn bus_status(&self) -> BusStatus {
        let status = self.regs().esr.read();
        if status & esr::BOFF != 0 {
            BusStatus::Off
        } else if status & (esr::EPVF | esr::EWGF) != 0 {
            BusStatus::Error
        } else {
            BusStatus::Ok
        }
    }

    fn rx_pending(&self) -> bool {
        let can = self.regs();
        can.rfr[0].read() & rfr::FMP_MASK != 0 || can.rfr[1].read() & rfr::FMP_MASK != 0
    }

    async fn transmit<'a>(&'a mut self, frame: &'a Frame) -> Result<(), TransportError> {
        if frame.dlc > 8 {
            return Err(TransportError::InvalidArgs);
        }
        let deadline = Instant::now() + Duration::from_millis(u64::from(TX_MAILBOX_TIMEOUT_MS));
        loop {
            if let Some(index) = self.free_mailbox() {
                self.write_mailbox(index, frame);
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(TransportError::Timeout);
            }
            if with_timeout(deadline - now, self.shared.tx_ready.wait())
                .await
                .is_err()
            {
                return Err(TransportError::Timeout);
            }
        }
    }
}

/// Interrupt-side view of the driver, held by the board layer's vector
/// routines.
///
/// Every method is safe to run at interrupt priority: the only shared
/// state touched is the queue's critical section and the lock-free
/// signal.
pub struct IrqHandle<'q, I: Instance, const N: usize = FRAME_QUEUE_DEPTH> {
    queue: &'q FrameQueue<N>,
    shared: &'q IrqShared,
    _instance: PhantomData<I>,
}

impl<'q, I: Instance, const N: usize> Clone for IrqHandle<'q, I, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'q, I: Instance, const N: usize> Copy for IrqHandle<'q, I, N> {}

impl<'q, I: Instance, const N: usize> IrqHandle<'q, I, N> {
    fn regs(&self) -> &RegisterBlock {
        unsafe { &*I::REGISTERS }
    }

    /// Service the transmit-mailbox-empty interrupt: acknowledge the
    /// completed requests and release one waiting transmitter.
    pub fn on_tx_mailbox_empty(&self) {
        self.regs()
            .tsr
            .write(tsr::RQCP0 | tsr::RQCP1 | tsr::RQCP2);
        self.shared.tx_ready.signal(());
    }

    /// Service a FIFO-pending interrupt: drain every waiting frame into
    /// the queue. On a full queue the frame is dropped and counted
    /// (newest loses); the hardware slot is released either way so the
    /// FIFO cannot wedge.
    pub fn on_rx_pending(&self, fifo: RxFifo) {
        let can = self.regs();
        let index = fifo as usize;
        while can.rfr[index].read() & rfr::FMP_MASK != 0 {
            let frame = read_fifo(can, index);
            can.rfr[index].write(rfr::RFOM | rfr::FOVR);
            let _ = self.queue.push_from_isr(&frame);
        }
    }

    /// Service the error/status interrupt. Recovery is the controller's
    /// own auto-bus-off policy; this routine only acknowledges and
    /// counts the event.
    pub fn on_status_change(&self) {
        let can = self.regs();
        self.shared.error_events.fetch_add(1, Ordering::Relaxed);
        let status = can.esr.read();
        if status & esr::BOFF != 0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("controller entered bus-off, auto-recovery pending");
        }
        can.msr.write(msr::ERRI);
    }
}

fn read_fifo(can: &RegisterBlock, index: usize) -> Frame {
    let mailbox = &can.rx[index];
    let rir_value = mailbox.rir.read();
    let extended = rir_value & tir::IDE != 0;
    let raw = if extended {
        (rir_value >> tir::EXID_SHIFT) & 0x1FFF_FFFF
    } else {
        (rir_value >> tir::STID_SHIFT) & 0x7FF
    };
    let dlc = (mailbox.rdtr.read() & 0xF).min(8) as u8;
    let low = mailbox.rdlr.read().to_le_bytes();
    let high = mailbox.rdhr.read().to_le_bytes();
    Frame {
        id: FrameId(raw),
        extended,
        dlc,
        payload: [
            low[0], low[1], low[2], low[3], high[0], high[1], high[2], high[3],
        ],
    }
}

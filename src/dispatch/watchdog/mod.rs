//! Staleness tracking for expected periodic receive messages.
//!
//! The registry owns a fixed pool of reusable slots, one per watched
//! message. The RX drain marks entries received; the per-tier check
//! step evaluates the timeout windows. Both sides run in task context
//! but on different gates, so the pool sits behind a critical-section
//! lock of its own.
//!
//! Staleness fires once per missed window: when a window expires the
//! entry is flagged, logged, and its window restarts, so a message that
//! stays absent fires again one timeout later — not on every check.
//! The queryable `stale` flag holds until the message is seen again.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant};

use crate::dispatch::RateTier;
use crate::error::DispatchError;

/// Maximum number of watched periodic messages.
pub const WATCH_SLOT_COUNT: usize = 16;

/// Internal state of one watched message.
#[derive(Debug, Clone, Copy)]
struct WatchEntry {
    message_id: u32,
    tier: RateTier,
    timeout: Duration,
    window_start: Instant,
    received_since_check: bool,
    stale: bool,
}

/// Fixed pool of watchdog entries keyed by message id.
pub struct WatchdogRegistry {
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Option<WatchEntry>; WATCH_SLOT_COUNT]>>,
}

impl WatchdogRegistry {
    /// Instantiate the registry with an empty slot pool.
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new([None; WATCH_SLOT_COUNT])),
        }
    }

    /// Release every slot.
    pub fn clear(&self) {
        self.slots.lock(|cell| {
            *cell.borrow_mut() = [None; WATCH_SLOT_COUNT];
        });
    }

    /// Start watching `message_id` on `tier` with the given window.
    ///
    /// Re-registering an id updates the entry in place and restarts its
    /// window.
    pub fn register(
        &self,
        message_id: u32,
        tier: RateTier,
        timeout: Duration,
        now: Instant,
    ) -> Result<(), DispatchError> {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let entry = WatchEntry {
                message_id,
                tier,
                timeout,
                window_start: now,
                received_since_check: false,
                stale: false,
            };
            if let Some(slot) = slots
                .iter_mut()
                .find(|slot| slot.is_some_and(|e| e.message_id == message_id))
            {
                *slot = Some(entry);
                return Ok(());
            }
            match slots.iter_mut().find(|slot| slot.is_none()) {
                Some(slot) => {
                    *slot = Some(entry);
                    Ok(())
                }
                None => Err(DispatchError::Exhausted),
            }
        })
    }

    /// Mark `message_id` as seen. Called for every received frame; ids
    /// without an entry are ignored.
    pub fn note_received(&self, message_id: u32) {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            if let Some(entry) = slots
                .iter_mut()
                .flatten()
                .find(|e| e.message_id == message_id)
            {
                entry.received_since_check = true;
            }
        });
    }

    /// Evaluate every entry of `tier` against `now` and clear the
    /// received flags for the tier. Returns how many entries were
    /// flagged stale in this pass.
    pub fn check_tier(&self, tier: RateTier, now: Instant) -> usize {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let mut flagged = 0;
            for entry in slots.iter_mut().flatten().filter(|e| e.tier == tier) {
                if entry.received_since_check {
                    entry.received_since_check = false;
                    entry.window_start = now;
                    entry.stale = false;
                } else if now >= entry.window_start + entry.timeout {
                    entry.stale = true;
                    entry.window_start = now;
                    flagged += 1;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("periodic message {=u32:#x} is stale", entry.message_id);
                }
            }
            flagged
        })
    }

    /// Stale flag of `message_id`, or `None` when the id is not watched.
    pub fn is_stale(&self, message_id: u32) -> Option<bool> {
        self.slots.lock(|cell| {
            cell.borrow()
                .iter()
                .flatten()
                .find(|e| e.message_id == message_id)
                .map(|e| e.stale)
        })
    }

    /// Number of active entries.
    pub fn watched(&self) -> usize {
        self.slots
            .lock(|cell| cell.borrow().iter().flatten().count())
    }

    /// Number of entries currently flagged stale.
    pub fn stale_count(&self) -> usize {
        self.slots.lock(|cell| {
            cell.borrow().iter().flatten().filter(|e| e.stale).count()
        })
    }
}

impl Default for WatchdogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Declarative bit-timing table for the supported bus bit rates.
//!
//! All nodes on the physical bus must sample each bit at the same point,
//! so these rows are part of the network contract and must stay
//! bit-for-bit stable. Every row divides the 48 MHz controller kernel
//! clock into 16 time quanta per bit (1 sync + 13 + 2), which places the
//! sample point at 87.5 % — the value recommended for automotive buses
//! with short stub lengths.
use crate::error::TransportError;

/// Clock feeding the CAN controller prescaler.
pub const CAN_KERNEL_CLOCK_HZ: u32 = 48_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Bus bit rates supported by the network.
pub enum Bitrate {
    /// 125 kbit/s
    Kbit125,
    /// 250 kbit/s
    Kbit250,
    /// 500 kbit/s
    Kbit500,
    /// 1 Mbit/s
    Mbit1,
}

impl Bitrate {
    /// Every supported rate, for table-driven tests.
    pub const ALL: [Bitrate; 4] = [
        Bitrate::Kbit125,
        Bitrate::Kbit250,
        Bitrate::Kbit500,
        Bitrate::Mbit1,
    ];

    /// Nominal rate in bits per second.
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Bitrate::Kbit125 => 125_000,
            Bitrate::Kbit250 => 250_000,
            Bitrate::Kbit500 => 500_000,
            Bitrate::Mbit1 => 1_000_000,
        }
    }

    /// Bit-timing row for this rate against [`CAN_KERNEL_CLOCK_HZ`].
    pub const fn timing(self) -> BitTiming {
        match self {
            Bitrate::Kbit125 => BitTiming {
                prescaler: 24,
                bs1: 13,
                bs2: 2,
            },
            Bitrate::Kbit250 => BitTiming {
                prescaler: 12,
                bs1: 13,
                bs2: 2,
            },
            Bitrate::Kbit500 => BitTiming {
                prescaler: 6,
                bs1: 13,
                bs2: 2,
            },
            Bitrate::Mbit1 => BitTiming {
                prescaler: 3,
                bs1: 13,
                bs2: 2,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One row of the bit-timing table.
pub struct BitTiming {
    /// Kernel-clock divider producing the time quantum.
    pub prescaler: u16,
    /// Quanta in bit segment 1 (propagation + phase 1).
    pub bs1: u8,
    /// Quanta in bit segment 2 (phase 2, after the sample point).
    pub bs2: u8,
}

impl BitTiming {
    /// Total quanta per bit, including the fixed synchronization quantum.
    pub const fn total_quanta(self) -> u32 {
        1 + self.bs1 as u32 + self.bs2 as u32
    }

    /// Bit rate this row produces from `kernel_clock_hz`.
    pub const fn bit_rate(self, kernel_clock_hz: u32) -> u32 {
        kernel_clock_hz / (self.prescaler as u32 * self.total_quanta())
    }

    /// Validate the register ranges of the controller (prescaler 1..=1024,
    /// bs1 1..=16, bs2 1..=8).
    pub const fn check(self) -> Result<(), TransportError> {
        if self.prescaler == 0 || self.prescaler > 1024 {
            return Err(TransportError::InvalidArgs);
        }
        if self.bs1 == 0 || self.bs1 > 16 || self.bs2 == 0 || self.bs2 > 8 {
            return Err(TransportError::InvalidArgs);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

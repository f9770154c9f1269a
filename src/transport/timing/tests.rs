//! Unit tests pinning the bit-timing table to the network contract.
use super::*;

#[test]
/// Total quanta must stay inside the 8–25 range recommended for a
/// stable sampling point.
fn test_total_quanta_in_recommended_range() {
    for rate in Bitrate::ALL {
        let quanta = rate.timing().total_quanta();
        assert!(
            (8..=25).contains(&quanta),
            "{} quanta at {} bit/s",
            quanta,
            rate.bits_per_second()
        );
    }
}

#[test]
/// Every row must reproduce its nominal rate exactly from the 48 MHz
/// kernel clock.
fn test_rows_reproduce_nominal_rates() {
    for rate in Bitrate::ALL {
        assert_eq!(
            rate.timing().bit_rate(CAN_KERNEL_CLOCK_HZ),
            rate.bits_per_second()
        );
    }
}

#[test]
/// The exact register values are part of the interoperability contract;
/// pin them so a refactor cannot silently change the wire timing.
fn test_rows_are_stable() {
    assert_eq!(
        Bitrate::Kbit125.timing(),
        BitTiming {
            prescaler: 24,
            bs1: 13,
            bs2: 2
        }
    );
    assert_eq!(
        Bitrate::Kbit250.timing(),
        BitTiming {
            prescaler: 12,
            bs1: 13,
            bs2: 2
        }
    );
    assert_eq!(
        Bitrate::Kbit500.timing(),
        BitTiming {
            prescaler: 6,
            bs1: 13,
            bs2: 2
        }
    );
    assert_eq!(
        Bitrate::Mbit1.timing(),
        BitTiming {
            prescaler: 3,
            bs1: 13,
            bs2: 2
        }
    );
}

#[test]
/// All rows fit the controller register ranges.
fn test_rows_fit_controller_ranges() {
    for rate in Bitrate::ALL {
        assert!(rate.timing().check().is_ok());
    }
}

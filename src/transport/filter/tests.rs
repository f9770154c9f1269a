//! Unit tests for acceptance rules and the bank allocator.
use super::*;
use crate::transport::frame::Frame;
use crate::transport::id::{FrameId, FrameKind};

fn frame(source: u8, message: u32) -> Frame {
    let id = FrameId::compose(source, FrameKind::Data, message).unwrap();
    Frame::new(id, &[0]).unwrap()
}

#[test]
/// A message rule covers exactly the 24 message-id bits and nothing of
/// the source or kind fields.
fn test_message_rule_shape() {
    let rule = Acceptance::for_message(0x000321).unwrap();
    assert_eq!(rule.filter, 0x000321);
    assert_eq!(rule.mask, 0x00FF_FFFF);
    assert!(rule.extended);
}

#[test]
/// A message rule matches the id from every source device.
fn test_message_rule_ignores_source() {
    let rule = Acceptance::for_message(0x000321).unwrap();
    for source in 0..16 {
        assert!(rule.accepts(&frame(source, 0x000321)));
    }
    assert!(!rule.accepts(&frame(3, 0x000322)));
}

#[test]
/// Message ids above 24 bits are rejected.
fn test_message_rule_range() {
    assert_eq!(
        Acceptance::for_message(0x0100_0000),
        Err(TransportError::InvalidArgs)
    );
}

#[test]
/// The allow-all rule accepts anything.
fn test_allow_all() {
    assert!(Acceptance::ALLOW_ALL.accepts(&frame(9, 0x12_3456)));
}

#[test]
/// The first installed rule replaces the boot-time bank 0.
fn test_first_install_replaces_default() {
    let mut banks = FilterBanks::new();
    banks.reset_to_allow_all();
    assert_eq!(banks.installed(), 1);

    let bank = banks
        .install(Acceptance::for_message(0x10).unwrap())
        .unwrap();
    assert_eq!(bank, 0);
    assert_eq!(banks.installed(), 1);

    // The allow-all behavior is gone.
    assert!(banks.accepts(&frame(1, 0x10)));
    assert!(!banks.accepts(&frame(1, 0x11)));
}

#[test]
/// Banks are handed out in order and run out at the hardware count.
fn test_bank_exhaustion() {
    let mut banks = FilterBanks::new();
    banks.reset_to_allow_all();

    for n in 0..FILTER_BANK_COUNT {
        let bank = banks
            .install(Acceptance::for_message(n as u32).unwrap())
            .unwrap();
        assert_eq!(bank, n);
    }
    assert_eq!(
        banks.install(Acceptance::for_message(0xFF).unwrap()),
        Err(TransportError::Exhausted)
    );
    assert_eq!(banks.installed(), FILTER_BANK_COUNT);
}

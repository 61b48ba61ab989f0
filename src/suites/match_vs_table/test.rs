//! Tests for the opcode dispatchers

use super::code::{dispatch_match, dispatch_table, opcode, verify_all, OPCODES};

#[test]
fn test_variants_agree() {
    verify_all().expect("table dispatch should match the match dispatch");
}

#[test]
fn test_multipliers() {
    for op in 0..8u8 {
        assert_eq!(dispatch_match(op, 10), 10 * (u32::from(op) + 1));
        assert_eq!(dispatch_table(op, 10), 10 * (u32::from(op) + 1));
    }
}

#[test]
fn test_invalid_opcodes_yield_zero() {
    assert_eq!(dispatch_match(8, 1234), 0);
    assert_eq!(dispatch_table(8, 1234), 0);
    assert_eq!(dispatch_table(200, 1234), 0);
}

#[test]
fn test_opcode_in_range() {
    for random in [0u32, 8, 9, 17, u32::MAX] {
        assert!(opcode(random) < OPCODES);
    }
    assert_eq!(opcode(9), 0);
}

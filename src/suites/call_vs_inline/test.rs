//! Tests for call vs inline implementations

use super::code::{chain, process_inline, process_with_calls, verify_all};

#[test]
fn test_variants_agree() {
    verify_all().expect("inline variant should match the call variant");
}

#[test]
fn test_expected_computation() {
    // double(5) = 10, add_ten(10) = 20, square(20) = 400
    assert_eq!(process_with_calls(5), 400);
    assert_eq!(process_inline(5), 400);
    // double(0) = 0, add_ten(0) = 10, square(10) = 100
    assert_eq!(process_inline(0), 100);
}

#[test]
fn test_wrapping() {
    // double(u32::MAX) wraps to u32::MAX - 1, plus ten wraps to 8, squared is 64
    assert_eq!(process_with_calls(u32::MAX), 64);
    assert_eq!(process_inline(u32::MAX), 64);
}

#[test]
fn test_chain() {
    assert_eq!(chain(process_inline, 0, 1), 100);
    // square(add_ten(double(100))) = 210^2
    assert_eq!(chain(process_inline, 0, 2), 44_100);
    assert_eq!(chain(process_inline, 7, 0), 7);
}

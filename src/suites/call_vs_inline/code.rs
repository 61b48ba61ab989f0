//! Implementations compared by the call-vs-inline suite.
//!
//! The helpers are `#[inline(never)]` so the calls survive optimization.

#[inline(never)]
fn double(x: u32) -> u32 {
    x.wrapping_mul(2)
}

#[inline(never)]
fn add_ten(x: u32) -> u32 {
    x.wrapping_add(10)
}

#[inline(never)]
fn square(x: u32) -> u32 {
    x.wrapping_mul(x)
}

/// `square(add_ten(double(value)))`, one call per step.
#[inline(never)]
pub fn process_with_calls(value: u32) -> u32 {
    square(add_ten(double(value)))
}

/// Same computation with every step inline.
#[inline(never)]
pub fn process_inline(value: u32) -> u32 {
    let doubled = value.wrapping_mul(2);
    let shifted = doubled.wrapping_add(10);
    shifted.wrapping_mul(shifted)
}

/// Apply `step` `length` times, each on the previous result.
#[inline(always)]
pub fn chain(step: fn(u32) -> u32, value: u32, length: u32) -> u32 {
    (0..length).fold(value, |acc, _| step(acc))
}

/// Check the inline version against the call version.
pub fn verify_all() -> Result<(), String> {
    let values = [0u32, 1, 2, 5, 10, 255, 1000, 65_535, 0x8000_0000, u32::MAX];
    for value in values {
        let expected = process_with_calls(value);
        let actual = process_inline(value);
        if actual != expected {
            return Err(format!(
                "inline variant failed for {}: expected {}, got {}",
                value, expected, actual
            ));
        }
    }
    Ok(())
}

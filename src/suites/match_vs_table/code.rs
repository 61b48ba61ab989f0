//! Opcode dispatchers.
//!
//! Opcodes 0..=7 multiply the value by `opcode + 1`; opcode 8 is invalid
//! and yields zero. Anything above is mapped into range by the caller.

/// Valid opcodes plus the invalid one.
pub const OPCODES: u8 = 9;

static MULTIPLIERS: [u32; OPCODES as usize] = [1, 2, 3, 4, 5, 6, 7, 8, 0];

/// Pick an opcode from a random word.
#[inline(always)]
pub fn opcode(random: u32) -> u8 {
    (random % u32::from(OPCODES)) as u8
}

#[inline(never)]
pub fn dispatch_match(opcode: u8, value: u32) -> u32 {
    match opcode {
        0 => value,
        1 => value.wrapping_mul(2),
        2 => value.wrapping_mul(3),
        3 => value.wrapping_mul(4),
        4 => value.wrapping_mul(5),
        5 => value.wrapping_mul(6),
        6 => value.wrapping_mul(7),
        7 => value.wrapping_mul(8),
        _ => 0,
    }
}

#[inline(never)]
pub fn dispatch_table(opcode: u8, value: u32) -> u32 {
    MULTIPLIERS
        .get(usize::from(opcode))
        .map_or(0, |&multiplier| value.wrapping_mul(multiplier))
}

pub fn verify_all() -> Result<(), String> {
    let values = [0u32, 1, 7, 1000, 0x1234_5678, u32::MAX];
    for opcode in 0..=u8::MAX {
        for value in values {
            let expected = dispatch_match(opcode, value);
            let actual = dispatch_table(opcode, value);
            if actual != expected {
                return Err(format!(
                    "table dispatch failed for opcode {} value {}: expected {}, got {}",
                    opcode, value, expected, actual
                ));
            }
        }
    }
    Ok(())
}

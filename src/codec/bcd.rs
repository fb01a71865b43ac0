//! Binary-Coded Decimal
//!
//! RTC registers hold one decimal digit per nibble. A byte therefore
//! carries 0..=99; wider values need a wider integer.

/// Pack a binary value into BCD, least significant digit in the low nibble
///
/// Digits beyond what fits in 32 bits are discarded.
#[must_use]
pub const fn to_bcd(mut value: u32) -> u32 {
    let mut packed = 0;
    let mut shift = 0;
    while value > 0 && shift < 32 {
        packed |= (value % 10) << shift;
        shift += 4;
        value /= 10;
    }
    packed
}

/// Unpack a BCD value to binary
///
/// Nibbles above 9 are taken at face value, as the chips never produce them.
#[must_use]
pub const fn from_bcd(mut packed: u32) -> u32 {
    let mut value = 0;
    let mut multiplier = 1;
    while packed > 0 {
        value += (packed & 0x0F) * multiplier;
        multiplier *= 10;
        packed >>= 4;
    }
    value
}

/// Pack a two-digit value into one register byte
///
/// Values above 99 keep only their last two digits.
#[must_use]
pub const fn byte_to_bcd(value: u8) -> u8 {
    to_bcd((value % 100) as u32) as u8
}

/// Unpack one register byte
#[must_use]
pub const fn byte_from_bcd(packed: u8) -> u8 {
    from_bcd(packed as u32) as u8
}

//! This module provides a set of shared, low-level utility functions used
//! throughout the inkpack core.
//!
//! These are the small pieces of integer math every kernel needs: signed bit
//! widths, overflow-free absolute values, and bit-to-byte rounding.

use crate::error::CodecError;

//==================================================================================
// 1. Integer Math Helpers
//==================================================================================

/// Returns the smallest width `w` in `1..=64` such that `-2^(w-1) <= value < 2^(w-1)`.
///
/// Zero and `-1` both need a single bit: the sign bit of a one-bit field.
#[inline]
pub fn signed_bit_width(value: i64) -> u8 {
    // For negative values the magnitude bits are those of the one's complement.
    let magnitude = (if value < 0 { !value } else { value }) as u64;
    (64 - magnitude.leading_zeros() as u8) + 1
}

/// The widest signed width required by any value in `values`, or `None` when empty.
pub fn max_signed_bit_width<I>(values: I) -> Option<u8>
where
    I: IntoIterator<Item = i64>,
{
    values.into_iter().map(signed_bit_width).max()
}

/// Number of whole bytes needed to hold `count` fields of `bit_width` bits.
pub fn packed_byte_len(count: usize, bit_width: u8) -> Result<usize, CodecError> {
    count
        .checked_mul(bit_width as usize)
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| {
            CodecError::Overflow(format!(
                "{} values of {} bits exceed the addressable bit range",
                count, bit_width
            ))
        })
}

/// Sign-extends the low `bit_width` bits of `raw`.
#[inline]
pub fn sign_extend(raw: u64, bit_width: u8) -> i64 {
    debug_assert!((1..=64).contains(&bit_width));
    let shift = 64 - bit_width as u32;
    ((raw << shift) as i64) >> shift
}

//! This module contains the pure, stateless kernels for the multi-byte
//! (base-128, continuation-bit) integer encoding.
//!
//! Each byte carries seven payload bits, least-significant group first; the high
//! bit marks that another byte follows. Signed values use a sign-magnitude
//! mapping (`|v| << 1 | sign`) so that small negative numbers stay short. All
//! decoders are bounded by a maximum byte count and by the input slice.

use num_traits::{PrimInt, Unsigned};

use crate::error::CodecError;

/// Longest encoding accepted for a 32-bit field (5 x 7 = 35 payload bits).
pub const MAX_BYTES_32: usize = 5;

const PAYLOAD_MASK: u8 = 0x7F;
const CONTINUATION_BIT: u8 = 0x80;

//==================================================================================
// 1. Generic Core Logic
//==================================================================================

/// Encodes a single unsigned integer, appending to `buffer`.
fn encode_one<T>(value: T, buffer: &mut Vec<u8>)
where
    T: PrimInt + Unsigned,
{
    let mut current = value;
    let continuation_threshold = T::from(CONTINUATION_BIT).unwrap_or_else(T::max_value);
    while current >= continuation_threshold {
        let low = (current & T::from(PAYLOAD_MASK).unwrap_or_else(T::zero))
            .to_u8()
            .unwrap_or(0);
        buffer.push(CONTINUATION_BIT | low);
        current = current >> 7;
    }
    buffer.push(current.to_u8().unwrap_or(0));
}

/// Decodes one value starting at `offset`, reading at most `max_bytes` bytes.
///
/// Returns the raw 64-bit payload and the number of bytes consumed.
fn decode_raw(input: &[u8], offset: usize, max_bytes: usize) -> Result<(u64, usize), CodecError> {
    let window = input
        .get(offset..)
        .ok_or_else(|| CodecError::truncated("a multi-byte integer"))?;

    let mut result = 0u64;
    for (index, &byte) in window.iter().take(max_bytes).enumerate() {
        result |= ((byte & PAYLOAD_MASK) as u64) << (7 * index);
        if byte & CONTINUATION_BIT == 0 {
            return Ok((result, index + 1));
        }
    }

    if window.len() < max_bytes {
        Err(CodecError::truncated("a multi-byte integer"))
    } else {
        Err(CodecError::MalformedInput(format!(
            "multi-byte integer at offset {} is longer than {} bytes",
            offset, max_bytes
        )))
    }
}

//==================================================================================
// 2. Public API for Single-Value Operations
//==================================================================================

/// Encodes an unsigned 32-bit value.
pub fn encode_unsigned(value: u32, buffer: &mut Vec<u8>) {
    encode_one(value, buffer);
}

/// Encodes a signed 32-bit value as `|v| << 1 | sign`.
///
/// `i32::MIN` maps to magnitude `2^31` with the sign bit set, which needs 33 bits
/// and therefore always takes the full five bytes.
pub fn encode_signed(value: i32, buffer: &mut Vec<u8>) {
    let magnitude = value.unsigned_abs() as u64;
    let sign = (value < 0) as u64;
    encode_one((magnitude << 1) | sign, buffer);
}

/// Decodes an unsigned 32-bit value at `offset`. Returns `(value, bytes_consumed)`.
pub fn decode_unsigned(input: &[u8], offset: usize) -> Result<(u32, usize), CodecError> {
    let (raw, consumed) = decode_raw(input, offset, MAX_BYTES_32)?;
    let value = u32::try_from(raw).map_err(|_| {
        CodecError::MalformedInput(format!(
            "multi-byte value {} at offset {} does not fit 32 bits",
            raw, offset
        ))
    })?;
    Ok((value, consumed))
}

/// Decodes a signed 32-bit value at `offset`. Returns `(value, bytes_consumed)`.
pub fn decode_signed(input: &[u8], offset: usize) -> Result<(i32, usize), CodecError> {
    let (raw, consumed) = decode_raw(input, offset, MAX_BYTES_32)?;
    let negative = raw & 1 != 0;
    let magnitude = raw >> 1;

    let value = match (negative, magnitude) {
        (true, m) if m == 1u64 << 31 => i32::MIN,
        (_, m) if m < 1u64 << 31 => {
            let m = m as i32;
            if negative {
                -m
            } else {
                m
            }
        }
        _ => {
            return Err(CodecError::MalformedInput(format!(
                "signed multi-byte magnitude {} at offset {} is out of range",
                magnitude, offset
            )))
        }
    };
    Ok((value, consumed))
}

//==================================================================================
// 3. Public API for Slice Operations
//==================================================================================

/// Encodes every value of `input_slice` as a signed multi-byte integer.
pub fn encode_all(input_slice: &[i32], output_buf: &mut Vec<u8>) {
    output_buf.reserve(input_slice.len());
    for &value in input_slice {
        encode_signed(value, output_buf);
    }
}

/// Decodes exactly `num_values` signed values. Trailing bytes are an error.
pub fn decode_all(input_bytes: &[u8], num_values: usize) -> Result<Vec<i32>, CodecError> {
    let mut values = Vec::with_capacity(num_values.min(input_bytes.len()));
    let mut offset = 0usize;
    for _ in 0..num_values {
        let (value, consumed) = decode_signed(input_bytes, offset)?;
        values.push(value);
        offset += consumed;
    }

    if offset != input_bytes.len() {
        return Err(CodecError::MalformedInput(format!(
            "{} trailing bytes after {} multi-byte values",
            input_bytes.len() - offset,
            num_values
        )));
    }
    Ok(values)
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_encodings() {
        let mut buf = Vec::new();
        encode_unsigned(0, &mut buf);
        encode_unsigned(127, &mut buf);
        encode_unsigned(128, &mut buf);
        encode_unsigned(624_485, &mut buf);
        assert_eq!(buf, vec![0x00, 0x7F, 0x80, 0x01, 0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn test_signed_uses_sign_magnitude() {
        let mut buf = Vec::new();
        encode_signed(1, &mut buf);
        encode_signed(-1, &mut buf);
        encode_signed(-64, &mut buf);
        assert_eq!(buf, vec![0x02, 0x03, 0x81, 0x01]);
    }

    #[test]
    fn test_signed_extremes_roundtrip() {
        for value in [i32::MIN, i32::MIN + 1, -1, 0, 1, i32::MAX] {
            let mut buf = Vec::new();
            encode_signed(value, &mut buf);
            let (decoded, consumed) = decode_signed(&buf, 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }

        let mut buf = Vec::new();
        encode_signed(i32::MIN, &mut buf);
        assert_eq!(buf.len(), MAX_BYTES_32);
    }

    #[test]
    fn test_decode_at_offset() {
        let mut buf = vec![0xAA];
        encode_unsigned(300, &mut buf);
        assert_eq!(decode_unsigned(&buf, 1).unwrap(), (300, 2));
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let mut buf = Vec::new();
        encode_unsigned(624_485, &mut buf);
        let result = decode_unsigned(&buf[..2], 0);
        assert!(matches!(result, Err(CodecError::MalformedInput(_))));

        assert!(decode_unsigned(&buf, 10).is_err());
    }

    #[test]
    fn test_decode_overlong_encoding() {
        let overlong = vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        let result = decode_unsigned(&overlong, 0);
        if let Err(CodecError::MalformedInput(msg)) = result {
            assert!(msg.contains("longer than"));
        } else {
            panic!("Expected MalformedInput for a six-byte integer");
        }
    }

    #[test]
    fn test_decode_value_wider_than_32_bits() {
        // Five bytes carrying bit 32.
        let wide = vec![0x80, 0x80, 0x80, 0x80, 0x10];
        assert!(matches!(
            decode_unsigned(&wide, 0),
            Err(CodecError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_positive_two_pow_31_is_rejected() {
        let mut buf = Vec::new();
        encode_one(1u64 << 32, &mut buf);
        assert!(matches!(
            decode_signed(&buf, 0),
            Err(CodecError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_slice_roundtrip_and_trailing_bytes() {
        let original = vec![0, -1, 1_000, i32::MIN, i32::MAX];
        let mut encoded = Vec::new();
        encode_all(&original, &mut encoded);
        assert_eq!(decode_all(&encoded, original.len()).unwrap(), original);

        encoded.push(0);
        assert!(decode_all(&encoded, original.len()).is_err());
    }

    proptest! {
        #[test]
        fn prop_unsigned_roundtrip(value in any::<u32>()) {
            let mut buf = Vec::new();
            encode_unsigned(value, &mut buf);
            prop_assert!(buf.len() <= MAX_BYTES_32);
            prop_assert_eq!(decode_unsigned(&buf, 0).unwrap(), (value, buf.len()));
        }

        #[test]
        fn prop_signed_roundtrip(value in any::<i32>()) {
            let mut buf = Vec::new();
            encode_signed(value, &mut buf);
            prop_assert_eq!(decode_signed(&buf, 0).unwrap(), (value, buf.len()));
        }

        #[test]
        fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..12), offset in 0usize..14) {
            let _ = decode_signed(&bytes, offset);
            let _ = decode_unsigned(&bytes, offset);
        }
    }
}

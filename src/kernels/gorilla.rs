//! This module contains the adaptive fixed-width packer ("Gorilla" kernel).
//!
//! Every value of a buffer is written at one shared bit width, chosen by the
//! planner as the smallest width that represents all of them as signed fields.
//! Two front-ends share the packing loop:
//!
//! * packet streams (`i32` samples), optionally after the delta-delta transform,
//!   with the two history seeds emitted as signed multi-byte integers;
//! * property buffers, whose items are little-endian `i8`/`i16`/`i32` units and
//!   whose item count is recovered from the payload length and a pad count.

use std::marker::PhantomData;

use crate::error::CodecError;
use crate::kernels::bitstream::{BitReader, BitWriter};
use crate::kernels::delta_delta::{DeltaDelta, Residual};
use crate::kernels::multibyte;
use crate::traits::PackedItem;
use crate::utils::{packed_byte_len, sign_extend, signed_bit_width};

/// The widest packet field; a descriptor width of 0 stands for this.
pub const FULL_WIDTH: u8 = 32;

//==================================================================================
// 1. Generic Core Logic (The "Engine")
//==================================================================================

/// Writes each value as a `bit_width`-bit two's-complement field.
fn pack<I>(values: I, bit_width: u8, writer: &mut BitWriter) -> Result<(), CodecError>
where
    I: IntoIterator<Item = i64>,
{
    for value in values {
        if signed_bit_width(value) > bit_width {
            return Err(CodecError::InvalidArgument(format!(
                "value {} does not fit a {}-bit field",
                value, bit_width
            )));
        }
        writer.write(value as u64, bit_width);
    }
    Ok(())
}

/// Reads one sign-extended `bit_width`-bit field.
fn unpack_one(reader: &mut BitReader<'_>, bit_width: u8) -> Result<i64, CodecError> {
    let raw = reader.read(bit_width)?;
    Ok(sign_extend(raw, bit_width))
}

#[inline]
fn effective_width(bit_width: u8) -> u8 {
    if bit_width == 0 {
        FULL_WIDTH
    } else {
        bit_width
    }
}

//==================================================================================
// 2. Packet Streams
//==================================================================================

/// Packs `input` at `bit_width` bits per value (0 means full width), appending to `output`.
///
/// With `use_delta_delta`, the first two residuals are written as signed
/// multi-byte seeds and the remaining residuals are bit-packed. The caller
/// (the planner) guarantees that no residual overflows and that `input` holds
/// at least three samples in that case.
pub fn encode_packets(
    input: &[i32],
    bit_width: u8,
    use_delta_delta: bool,
    output: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let bit_width = effective_width(bit_width);
    if bit_width > FULL_WIDTH {
        return Err(CodecError::InvalidArgument(format!(
            "packet bit width {} exceeds {}",
            bit_width, FULL_WIDTH
        )));
    }

    let mut writer = BitWriter::with_capacity(input.len() * bit_width as usize);
    if use_delta_delta {
        if input.len() < 3 {
            return Err(CodecError::InvalidArgument(
                "delta-delta packing needs at least three samples".to_string(),
            ));
        }
        let residuals = DeltaDelta::transform_all(input);
        if let Some(position) = residuals.iter().position(Residual::is_overflow) {
            return Err(CodecError::InvalidArgument(format!(
                "delta-delta residual at index {} overflows 32 bits",
                position
            )));
        }
        multibyte::encode_signed(residuals[0].primary, output);
        multibyte::encode_signed(residuals[1].primary, output);
        pack(
            residuals[2..].iter().map(|r| r.primary as i64),
            bit_width,
            &mut writer,
        )?;
    } else {
        pack(input.iter().map(|&x| x as i64), bit_width, &mut writer)?;
    }

    log::trace!(
        "gorilla: packed {} samples at {} bits (delta-delta: {})",
        input.len(),
        bit_width,
        use_delta_delta
    );
    writer.finish_into(output);
    Ok(())
}

/// Decodes exactly `count` samples. Returns the samples and the bytes consumed.
///
/// Decoding is bounded by `count`, not by the stream length, so trailing pad
/// bits in the final byte are never mistaken for values.
pub fn decode_packets(
    input: &[u8],
    bit_width: u8,
    use_delta_delta: bool,
    count: usize,
) -> Result<(Vec<i32>, usize), CodecError> {
    let bit_width = effective_width(bit_width);
    let mut output = Vec::with_capacity(count.min(input.len().saturating_mul(8)));
    let mut offset = 0usize;

    let mut xf = DeltaDelta::new();
    if use_delta_delta {
        xf.reset_state();
        for _ in 0..count.min(2) {
            let (seed, consumed) = multibyte::decode_signed(input, offset)?;
            offset += consumed;
            output.push(xf.inverse_transform(Residual {
                primary: seed,
                extra: 0,
            }));
        }
    }

    let remaining = count - output.len();
    let payload = &input[offset..];
    let capacity = payload.len().saturating_mul(8) / bit_width as usize;
    if capacity < remaining {
        return Err(CodecError::MalformedInput(format!(
            "gorilla payload of {} bytes holds {} samples at {} bits, {} requested",
            payload.len(),
            capacity,
            bit_width,
            remaining
        )));
    }

    let mut reader = BitReader::new(payload);
    for _ in 0..remaining {
        let value = unpack_one(&mut reader, bit_width)? as i32;
        output.push(if use_delta_delta {
            xf.inverse_transform(Residual {
                primary: value,
                extra: 0,
            })
        } else {
            value
        });
    }

    Ok((output, offset + reader.bytes_consumed()))
}

//==================================================================================
// 3. Property Buffers
//==================================================================================

/// Number of empty `bit_width`-bit slots left in the final byte after packing `count` items.
pub fn pad_count(count: usize, bit_width: u8) -> Result<u8, CodecError> {
    let bits = count
        .checked_mul(bit_width as usize)
        .ok_or_else(|| CodecError::Overflow(format!("{} items of {} bits", count, bit_width)))?;
    let slack = bits.div_ceil(8) * 8 - bits;
    Ok((slack / bit_width as usize) as u8)
}

/// Packs a property buffer whose items are of type `T`.
pub struct PropertyPacker<T: PackedItem> {
    _item: PhantomData<T>,
}

impl<T: PackedItem> PropertyPacker<T> {
    /// Number of whole items in `bytes`; a ragged tail is an error.
    pub fn item_count(bytes: &[u8]) -> Result<usize, CodecError> {
        if bytes.len() % T::WIDTH != 0 {
            return Err(CodecError::InvalidArgument(format!(
                "property buffer of {} bytes is not a multiple of the {}-byte item size",
                bytes.len(),
                T::WIDTH
            )));
        }
        Ok(bytes.len() / T::WIDTH)
    }

    /// Items of `bytes`, widened for analysis.
    pub fn items<'a>(bytes: &'a [u8]) -> impl Iterator<Item = i64> + 'a
    where
        T: 'a,
    {
        bytes
            .chunks_exact(T::WIDTH)
            .filter_map(T::read_le)
            .map(PackedItem::widen)
    }

    /// Packs every item at `bit_width` bits, appending to `output`.
    pub fn encode(bytes: &[u8], bit_width: u8, output: &mut Vec<u8>) -> Result<(), CodecError> {
        let count = Self::item_count(bytes)?;
        let mut writer = BitWriter::with_capacity(count * bit_width as usize);
        pack(Self::items(bytes), bit_width, &mut writer)?;
        writer.finish_into(output);
        Ok(())
    }

    /// Unpacks a payload into little-endian item bytes.
    ///
    /// The item count is `payload_bits / bit_width - pad`; the payload must be
    /// exactly as long as that many items need, and no longer than `max_bytes`
    /// once unpacked.
    pub fn decode(
        payload: &[u8],
        bit_width: u8,
        pad: u8,
        max_bytes: usize,
    ) -> Result<Vec<u8>, CodecError> {
        if bit_width == 0 || bit_width as usize > T::WIDTH * 8 {
            return Err(CodecError::MalformedInput(format!(
                "bit width {} is invalid for {}-byte items",
                bit_width,
                T::WIDTH
            )));
        }

        let payload_bits = payload
            .len()
            .checked_mul(8)
            .ok_or_else(|| CodecError::Overflow("property payload bit length".to_string()))?;
        let count = (payload_bits / bit_width as usize)
            .checked_sub(pad as usize)
            .ok_or_else(|| {
                CodecError::MalformedInput(format!(
                    "pad count {} exceeds the {} slots of a {}-byte payload",
                    pad,
                    payload_bits / bit_width as usize,
                    payload.len()
                ))
            })?;
        if packed_byte_len(count, bit_width)? != payload.len() {
            return Err(CodecError::MalformedInput(format!(
                "{} items at {} bits do not fill a {}-byte payload",
                count,
                bit_width,
                payload.len()
            )));
        }
        let out_len = count.saturating_mul(T::WIDTH);
        if out_len > max_bytes {
            return Err(CodecError::MalformedInput(format!(
                "property payload expands to {} bytes, limit is {}",
                out_len, max_bytes
            )));
        }

        let mut reader = BitReader::new(payload);
        let mut output = Vec::with_capacity(out_len);
        for _ in 0..count {
            let value = unpack_one(&mut reader, bit_width)?;
            T::narrow(value).write_le(&mut output);
        }
        Ok(output)
    }
}

//! This module contains the MSB-first bit cursor shared by every packing kernel.
//!
//! Fields are written most-significant bit first, and the first field starts at
//! the most-significant bit of the first byte. This is the packing order the
//! descriptor format depends on, so the Gorilla and Huffman kernels never touch
//! bits directly. The reader is bounds-checked: asking for more bits than remain
//! is a `MalformedInput` error, never an out-of-bounds access.

use bitvec::prelude::*;

use crate::error::CodecError;

//==================================================================================
// 1. Writer
//==================================================================================

/// An append-only bit stream backed by a `BitVec<u8, Msb0>`.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity_bits` bits.
    pub fn with_capacity(capacity_bits: usize) -> Self {
        Self {
            bits: BitVec::with_capacity(capacity_bits),
        }
    }

    /// Writes the low `width` bits of `value`, most-significant first. `width` must be <= 64.
    pub fn write(&mut self, value: u64, width: u8) {
        debug_assert!(width <= 64);
        if width == 0 {
            return;
        }
        let field = &value.view_bits::<Msb0>()[64 - width as usize..];
        self.bits.extend_from_bitslice(field);
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Writes `count` one-bits followed by a single zero-bit.
    pub fn write_unary(&mut self, count: usize) {
        for _ in 0..count {
            self.bits.push(true);
        }
        self.bits.push(false);
    }

    /// Number of bits written so far.
    #[inline]
    pub fn len_bits(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of bytes the stream occupies once flushed.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.bits.len().div_ceil(8)
    }

    /// Flushes the stream, zero-padding the final partial byte.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let live = self.bits.len();
        // The dead tail of the last byte is unspecified storage; clear it.
        self.bits.resize(live.div_ceil(8) * 8, false);
        self.bits.into_vec()
    }

    /// Flushes the stream onto the end of `output`.
    pub fn finish_into(self, output: &mut Vec<u8>) {
        output.extend_from_slice(&self.into_bytes());
    }
}

//==================================================================================
// 2. Reader
//==================================================================================

/// A bounds-checked cursor over an MSB-first bit stream.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bits: bytes.view_bits::<Msb0>(),
            pos: 0,
        }
    }

    /// Number of bits left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.bits.len()
    }

    /// Current bit offset from the start of the stream.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes touched so far, counting a partially read byte as consumed.
    #[inline]
    pub fn bytes_consumed(&self) -> usize {
        self.pos.div_ceil(8)
    }

    pub fn read_bit(&mut self) -> Result<bool, CodecError> {
        let bit = *self
            .bits
            .get(self.pos)
            .ok_or_else(|| CodecError::truncated("a single bit"))?;
        self.pos += 1;
        Ok(bit)
    }

    /// Reads a `width`-bit unsigned field, most-significant bit first.
    pub fn read(&mut self, width: u8) -> Result<u64, CodecError> {
        if width == 0 {
            return Ok(0);
        }
        if width > 64 {
            return Err(CodecError::InvalidArgument(format!(
                "bit field width {} exceeds 64",
                width
            )));
        }
        let width = width as usize;
        if self.remaining() < width {
            return Err(CodecError::MalformedInput(format!(
                "bit stream exhausted: needed {} bits at offset {}, {} remain",
                width,
                self.pos,
                self.remaining()
            )));
        }

        let mut value = 0u64;
        for bit in self.bits[self.pos..self.pos + width].iter().by_vals() {
            value = (value << 1) | bit as u64;
        }
        self.pos += width;
        Ok(value)
    }

    /// Counts one-bits up to and including the terminating zero-bit.
    ///
    /// A run longer than `max_ones` is rejected so a corrupt stream of ones
    /// cannot be mistaken for a valid prefix.
    pub fn read_unary(&mut self, max_ones: usize) -> Result<usize, CodecError> {
        let mut ones = 0usize;
        while self.read_bit()? {
            ones += 1;
            if ones > max_ones {
                return Err(CodecError::MalformedInput(format!(
                    "unary prefix longer than {} bits at offset {}",
                    max_ones, self.pos
                )));
            }
        }
        Ok(ones)
    }
}

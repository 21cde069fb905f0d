//! This module contains the decoder for legacy LZ-compressed property payloads.
//!
//! The format is a classic flag-byte LZSS stream over a ring buffer of
//! `RING_LEN` bytes. Each flag byte governs the next eight tokens, least
//! significant bit first: a set bit is a literal byte, a clear bit is a two-byte
//! back-reference `(position, length)` into the ring. The ring is zero-seeded
//! except for its last `MAX_MATCH` slots, which must be written before they can
//! be referenced.
//!
//! Only decoding is supported; new payloads are never LZ-compressed.

use crate::error::CodecError;

/// Ring buffer length.
pub const RING_LEN: usize = 4069;

/// Longest back-reference, and the size of the unseeded tail of the ring.
pub const MAX_MATCH: usize = 16;

/// Added to the 4-bit length field; the copy then runs one byte further.
const MATCH_BIAS: usize = 2;

/// Where the first decoded byte lands.
const START: usize = RING_LEN - MAX_MATCH;

/// The sliding window that back-references index into.
struct RingBuffer {
    data: Vec<u8>,
    cursor: usize,
    written: usize,
}

impl RingBuffer {
    fn new() -> Self {
        Self {
            data: vec![0u8; RING_LEN],
            cursor: START,
            written: 0,
        }
    }

    #[inline]
    fn push(&mut self, byte: u8) {
        self.data[self.cursor] = byte;
        self.cursor = (self.cursor + 1) % RING_LEN;
        self.written = self.written.saturating_add(1);
    }

    /// Reads slot `pos`, refusing tail slots that were never written.
    #[inline]
    fn get(&self, pos: usize) -> Result<u8, CodecError> {
        let pos = pos % RING_LEN;
        if pos >= START && pos - START >= self.written {
            return Err(CodecError::MalformedInput(format!(
                "LZ back-reference reads unwritten ring slot {}",
                pos
            )));
        }
        Ok(self.data[pos])
    }
}

/// Decompresses an LZ payload (the bytes after the descriptor).
///
/// Fails with `MalformedInput` when a back-reference is cut short, reads an
/// unwritten slot, or the output would exceed `max_output` bytes. A trailing
/// flag byte with no tokens after it is ignored.
pub fn decompress(input: &[u8], max_output: usize) -> Result<Vec<u8>, CodecError> {
    let mut ring = RingBuffer::new();
    let mut output = Vec::with_capacity(input.len().saturating_mul(2).min(max_output));
    let mut flags: u16 = 0;
    let mut index = 0usize;

    while index < input.len() {
        flags >>= 1;
        if flags & 0x100 == 0 {
            flags = input[index] as u16 | 0xFF00;
            index += 1;
        }

        let Some(&first) = input.get(index) else {
            break;
        };
        index += 1;

        if flags & 1 != 0 {
            if output.len() >= max_output {
                return Err(output_limit(max_output));
            }
            output.push(first);
            ring.push(first);
            continue;
        }

        let &second = input
            .get(index)
            .ok_or_else(|| CodecError::truncated("the second byte of an LZ back-reference"))?;
        index += 1;

        let position = first as usize | ((second as usize & 0xF0) << 4);
        let length = (second as usize & 0x0F) + MATCH_BIAS;
        if output.len() + length + 1 > max_output {
            return Err(output_limit(max_output));
        }
        for offset in 0..=length {
            let byte = ring.get(position + offset)?;
            output.push(byte);
            ring.push(byte);
        }
    }

    log::trace!("lz: {} payload bytes expanded to {}", input.len(), output.len());
    Ok(output)
}

fn output_limit(max_output: usize) -> CodecError {
    CodecError::MalformedInput(format!(
        "LZ payload expands beyond the {}-byte limit",
        max_output
    ))
}

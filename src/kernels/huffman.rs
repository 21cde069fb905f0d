//! This module contains the bucketed-Huffman kernel for packet streams.
//!
//! A table is a list of bucket widths. Bucket 0 always has width 0 and holds
//! the value zero; bucket `n` holds magnitudes starting at
//! `mins[n] = 1 + sum(2^(w_k - 1) for 1 <= k < n)`. A value is written as a
//! unary bucket prefix (`n` ones and a zero) followed by a `w_n`-bit payload
//! `((|v| - mins[n]) << 1) | sign`. A prefix of `size` ones is the escape code:
//! two plain symbols follow, the overflow part of a delta-delta residual and
//! then its primary part.
//!
//! The packet path always runs the delta-delta transform before coding, with
//! fresh history for every buffer.

use std::sync::OnceLock;

use crate::error::CodecError;
use crate::kernels::bitstream::{BitReader, BitWriter};
use crate::kernels::delta_delta::{DeltaDelta, Residual};

/// Most buckets a table may have, bucket 0 included.
pub const MAX_BUCKETS: usize = 10;

/// Number of built-in tables, addressed by descriptor indices `0..8`.
pub const DEFAULT_TABLE_COUNT: usize = 8;

/// Largest magnitude a table must reach: `|i32::MIN|`.
const MAX_MAGNITUDE: u64 = 1 << 31;

const DEFAULT_BUCKET_WIDTHS: [&[u8]; DEFAULT_TABLE_COUNT] = [
    &[0, 1, 2, 4, 6, 8, 12, 16, 24, 32],
    &[0, 1, 1, 2, 4, 8, 12, 16, 24, 32],
    &[0, 1, 1, 1, 2, 4, 8, 14, 22, 32],
    &[0, 2, 2, 3, 5, 8, 12, 16, 24, 32],
    &[0, 3, 4, 5, 8, 12, 16, 24, 32],
    &[0, 4, 6, 8, 12, 16, 24, 32],
    &[0, 6, 8, 12, 16, 24, 32],
    &[0, 7, 8, 12, 16, 24, 32],
];

static DEFAULT_TABLES: OnceLock<Vec<HuffmanTable>> = OnceLock::new();

//==================================================================================
// 1. Tables
//==================================================================================

/// One bucket table with its precomputed minimum magnitudes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTable {
    widths: Vec<u8>,
    mins: Vec<u64>,
}

impl HuffmanTable {
    fn build(widths: &[u8]) -> Self {
        let mut mins = Vec::with_capacity(widths.len());
        mins.push(0);
        let mut next = 1u64;
        for &width in &widths[1..] {
            mins.push(next);
            next += 1u64 << (width - 1);
        }
        Self {
            widths: widths.to_vec(),
            mins,
        }
    }

    /// Validates and builds a caller-supplied table.
    ///
    /// A table needs 2 to 10 buckets, bucket 0 of width 0, every other bucket
    /// of width 1 to 32, and enough range to code `|i32::MIN|`.
    pub fn from_widths(widths: &[u8]) -> Result<Self, CodecError> {
        if !(2..=MAX_BUCKETS).contains(&widths.len()) {
            return Err(CodecError::InvalidArgument(format!(
                "a Huffman table needs 2 to {} buckets, got {}",
                MAX_BUCKETS,
                widths.len()
            )));
        }
        if widths[0] != 0 {
            return Err(CodecError::InvalidArgument(
                "bucket 0 of a Huffman table must have width 0".to_string(),
            ));
        }
        if let Some(&bad) = widths[1..].iter().find(|&&w| !(1..=32).contains(&w)) {
            return Err(CodecError::InvalidArgument(format!(
                "Huffman bucket width {} is outside 1..=32",
                bad
            )));
        }

        let table = Self::build(widths);
        let last = table.size() - 1;
        let reach = table.mins[last] + (1u64 << (table.widths[last] - 1)) - 1;
        if reach < MAX_MAGNITUDE {
            return Err(CodecError::InvalidArgument(format!(
                "Huffman table {:?} only reaches magnitude {}",
                widths, reach
            )));
        }
        Ok(table)
    }

    /// A built-in table, or `None` when `index` is not below `DEFAULT_TABLE_COUNT`.
    pub fn default_table(index: usize) -> Option<&'static HuffmanTable> {
        DEFAULT_TABLES
            .get_or_init(|| DEFAULT_BUCKET_WIDTHS.iter().map(|w| Self::build(w)).collect())
            .get(index)
    }

    /// Number of buckets, bucket 0 included. Also the escape prefix length.
    #[inline]
    pub fn size(&self) -> usize {
        self.widths.len()
    }

    pub fn widths(&self) -> &[u8] {
        &self.widths
    }

    /// Largest bucket whose minimum magnitude is at most `magnitude`.
    fn bucket_for(&self, magnitude: u64) -> usize {
        self.mins
            .iter()
            .rposition(|&min| min <= magnitude)
            .unwrap_or(0)
    }

    //==============================================================================
    // 2. Symbol Coding
    //==============================================================================

    /// Writes one plain value.
    pub fn encode_value(&self, value: i32, writer: &mut BitWriter) {
        if value == 0 {
            writer.write_bit(false);
            return;
        }
        let magnitude = value.unsigned_abs() as u64;
        let bucket = self.bucket_for(magnitude);
        writer.write_unary(bucket);
        let payload = ((magnitude - self.mins[bucket]) << 1) | (value < 0) as u64;
        writer.write(payload, self.widths[bucket]);
    }

    /// Writes one residual, escaping it when it carries an overflow part.
    pub fn encode_residual(&self, residual: Residual, writer: &mut BitWriter) {
        if residual.is_overflow() {
            writer.write_unary(self.size());
            self.encode_value(residual.extra, writer);
        }
        self.encode_value(residual.primary, writer);
    }

    /// Reads one plain value. An escape prefix here is malformed.
    pub fn decode_value(&self, reader: &mut BitReader<'_>) -> Result<i32, CodecError> {
        let bucket = reader.read_unary(self.size())?;
        if bucket == self.size() {
            return Err(CodecError::MalformedInput(format!(
                "nested Huffman escape at bit offset {}",
                reader.position()
            )));
        }
        self.decode_bucket(bucket, reader)
    }

    /// Reads one residual, following an escape prefix if present.
    pub fn decode_residual(&self, reader: &mut BitReader<'_>) -> Result<Residual, CodecError> {
        let bucket = reader.read_unary(self.size())?;
        if bucket < self.size() {
            let primary = self.decode_bucket(bucket, reader)?;
            return Ok(Residual { primary, extra: 0 });
        }

        let extra = self.decode_value(reader)?;
        if extra == 0 {
            return Err(CodecError::MalformedInput(
                "Huffman escape carries an empty overflow part".to_string(),
            ));
        }
        let primary = self.decode_value(reader)?;
        Ok(Residual { primary, extra })
    }

    fn decode_bucket(&self, bucket: usize, reader: &mut BitReader<'_>) -> Result<i32, CodecError> {
        if bucket == 0 {
            return Ok(0);
        }
        let payload = reader.read(self.widths[bucket])?;
        let negative = payload & 1 != 0;
        let magnitude = (payload >> 1) + self.mins[bucket];

        match (negative, magnitude) {
            (true, m) if m == MAX_MAGNITUDE => Ok(i32::MIN),
            (_, m) if m < MAX_MAGNITUDE => {
                let m = m as i32;
                Ok(if negative { -m } else { m })
            }
            _ => Err(CodecError::MalformedInput(format!(
                "Huffman magnitude {} in bucket {} is out of range",
                magnitude, bucket
            ))),
        }
    }
}

//==================================================================================
// 3. Public API for Packet Streams
//==================================================================================

/// Delta-delta transforms `input` and Huffman-codes the residuals, appending to `output`.
pub fn encode(table: &HuffmanTable, input: &[i32], output: &mut Vec<u8>) {
    let mut writer = BitWriter::with_capacity(input.len() * 4);
    let mut xf = DeltaDelta::new();
    xf.reset_state();

    let mut escapes = 0usize;
    for &value in input {
        let residual = xf.transform(value);
        escapes += residual.is_overflow() as usize;
        table.encode_residual(residual, &mut writer);
    }

    log::trace!(
        "huffman: coded {} samples into {} bits ({} escapes)",
        input.len(),
        writer.len_bits(),
        escapes
    );
    writer.finish_into(output);
}

/// Decodes exactly `count` samples. Returns the samples and the bytes consumed.
pub fn decode(
    table: &HuffmanTable,
    input: &[u8],
    count: usize,
) -> Result<(Vec<i32>, usize), CodecError> {
    let mut reader = BitReader::new(input);
    let mut xf = DeltaDelta::new();
    xf.reset_state();

    let mut output = Vec::with_capacity(count.min(input.len().saturating_mul(8)));
    for _ in 0..count {
        let residual = table.decode_residual(&mut reader)?;
        output.push(xf.inverse_transform(residual));
    }
    Ok((output, reader.bytes_consumed()))
}

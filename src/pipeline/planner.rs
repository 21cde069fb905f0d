// In: src/pipeline/planner.rs

//! The algorithm planner for inkpack.
//!
//! This module decides *how* a buffer should be encoded, but never encodes it:
//! 1. `best_default_huffman` picks a built-in Huffman table from the spread of
//!    the buffer's delta-delta residuals.
//! 2. `find_packet_algorithm` picks the Gorilla bit width and whether the
//!    delta-delta transform pays for itself.
//! 3. `best_property_layout` / `property_layout_for_hint` pick the item width and
//!    bit width for a property buffer.
//!
//! The descriptor byte, not these heuristics, is the interoperability contract:
//! any choice made here round-trips.

use crate::error::CodecError;
use crate::kernels::delta_delta::{DeltaDelta, Residual};
use crate::kernels::gorilla::PropertyPacker;
use crate::pipeline::descriptor::{ItemWidth, PacketAlgorithm, PropertyLayout};
use crate::utils::{max_signed_bit_width, packed_byte_len};

/// Below this many samples there is no delta-delta residual to measure.
const MIN_DELTA_DELTA_SAMPLES: usize = 3;

/// Scale applied to the mean squared residual before it meets the breakpoints.
const HUFFMAN_SPREAD_SCALE: f64 = 0.205625;

/// Spread breakpoints; index `i` selects table `i + 1`.
const HUFFMAN_SPREAD_BREAKPOINTS: [f64; 8] = [1.0, 1.0, 1.0, 4.0, 9.0, 16.0, 36.0, 49.0];

//==================================================================================
// 1. Packet Planning
//==================================================================================

/// Chooses a built-in Huffman table for `input`, or `None` when the buffer is too
/// short for the statistic and Gorilla should be used instead.
pub(crate) fn best_default_huffman(input: &[i32]) -> Option<u8> {
    if input.len() < MIN_DELTA_DELTA_SAMPLES {
        return None;
    }

    let residuals = DeltaDelta::transform_all(input);
    let sum_of_squares: f64 = residuals[2..]
        .iter()
        .filter(|r| !r.is_overflow())
        .map(|r| {
            let v = r.primary as f64;
            v * v
        })
        .sum();
    let spread = sum_of_squares * HUFFMAN_SPREAD_SCALE / (input.len() - 1) as f64;

    let breakpoint = (2..=6)
        .rev()
        .find(|&i| spread > HUFFMAN_SPREAD_BREAKPOINTS[i])
        .unwrap_or(1);
    let table_index = breakpoint as u8 + 1;

    log::debug!(
        "planner: {} samples, residual spread {:.3} -> huffman table {}",
        input.len(),
        spread,
        table_index
    );
    Some(table_index)
}

/// Chooses the Gorilla width for `input`, with delta-delta if requested and worth it.
///
/// Delta-delta is used only when the buffer has at least three samples, no
/// residual (seeds included) overflows 32 bits, and the residual width is at
/// most half of the raw width.
pub(crate) fn find_packet_algorithm(input: &[i32], try_delta_delta: bool) -> PacketAlgorithm {
    let raw_width = max_signed_bit_width(input.iter().map(|&x| x as i64)).unwrap_or(1);
    let plain = PacketAlgorithm::Gorilla {
        bit_width: raw_width,
        delta_delta: false,
    };

    if !try_delta_delta || input.len() < MIN_DELTA_DELTA_SAMPLES {
        return plain;
    }

    let residuals = DeltaDelta::transform_all(input);
    if residuals.iter().any(Residual::is_overflow) {
        log::debug!("planner: delta-delta overflows, packing raw at {} bits", raw_width);
        return plain;
    }

    let dd_width =
        max_signed_bit_width(residuals[2..].iter().map(|r| r.primary as i64)).unwrap_or(1);
    log::debug!(
        "planner: gorilla raw width {} vs delta-delta width {}",
        raw_width,
        dd_width
    );

    if dd_width <= raw_width / 2 {
        PacketAlgorithm::Gorilla {
            bit_width: dd_width,
            delta_delta: true,
        }
    } else {
        plain
    }
}

//==================================================================================
// 2. Property Planning
//==================================================================================

/// Widest signed width of any item when `bytes` is read as `item_width` items.
fn item_bit_width(bytes: &[u8], item_width: ItemWidth) -> Result<u8, CodecError> {
    let width = match item_width {
        ItemWidth::Byte => {
            PropertyPacker::<i8>::item_count(bytes)?;
            max_signed_bit_width(PropertyPacker::<i8>::items(bytes))
        }
        ItemWidth::Short => {
            PropertyPacker::<i16>::item_count(bytes)?;
            max_signed_bit_width(PropertyPacker::<i16>::items(bytes))
        }
        ItemWidth::Int => {
            PropertyPacker::<i32>::item_count(bytes)?;
            max_signed_bit_width(PropertyPacker::<i32>::items(bytes))
        }
    };
    width.ok_or_else(|| {
        CodecError::InvalidArgument("cannot plan an empty property buffer".to_string())
    })
}

/// The tightest layout for `bytes` read as `item_width` items.
pub(crate) fn property_layout(
    bytes: &[u8],
    item_width: ItemWidth,
) -> Result<PropertyLayout, CodecError> {
    let bit_width = item_bit_width(bytes, item_width)?;
    PropertyLayout::for_items(item_width, bit_width, bytes.len() / item_width.bytes())
}

/// Tries every item width that divides the buffer and keeps the smallest payload.
pub(crate) fn best_property_layout(bytes: &[u8]) -> Result<PropertyLayout, CodecError> {
    let mut best: Option<(PropertyLayout, usize)> = None;

    for item_width in ItemWidth::ALL {
        if bytes.len() % item_width.bytes() != 0 {
            continue;
        }
        let layout = property_layout(bytes, item_width)?;
        let size = packed_byte_len(bytes.len() / item_width.bytes(), layout.bit_width)?;
        log::debug!(
            "planner: property as {:?} items at {} bits -> {} bytes",
            item_width,
            layout.bit_width,
            size
        );
        if best.map_or(true, |(_, best_size)| size < best_size) {
            best = Some((layout, size));
        }
    }

    best.map(|(layout, _)| layout).ok_or_else(|| {
        CodecError::InvalidArgument("cannot plan an empty property buffer".to_string())
    })
}

/// The layout a caller asked for, checked against the data.
pub(crate) fn property_layout_for_hint(
    bytes: &[u8],
    item_width: ItemWidth,
    bit_width: u8,
) -> Result<PropertyLayout, CodecError> {
    let needed = item_bit_width(bytes, item_width)?;
    if needed > bit_width {
        return Err(CodecError::InvalidArgument(format!(
            "hinted width of {} bits cannot hold items needing {} bits",
            bit_width, needed
        )));
    }
    PropertyLayout::for_items(item_width, bit_width, bytes.len() / item_width.bytes())
}

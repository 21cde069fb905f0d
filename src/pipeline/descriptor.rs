//! Defines the one-byte algorithm descriptor that prefixes every compressed buffer.
//! This module is the single source of truth for reading and writing that byte,
//! for packet streams and for property buffers alike.
//!
//! Packet descriptors:
//!
//! ```text
//!   00 d wwwww   Gorilla; d = delta-delta, w = bit width (0 = 32)
//!   1x - ttttt   Huffman with table index t
//!   01 ------    invalid
//! ```
//!
//! Property descriptors:
//!
//! ```text
//!   01 iiiiii    Gorilla over 4-byte items, map index i
//!   001 iiiii    Gorilla over 2-byte items, map index i
//!   000 iiiii    Gorilla over 1-byte items, map index i
//!   10000000     legacy LZ (decode only)
//! ```
//!
//! A map index below 24 names a `(bit width, pad count)` pair from a fixed
//! table; an index of 24 or more names bit width `index - 8` with no pad.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

//==================================================================================
// Format Constants
//==================================================================================
/// Hint asking the orchestrator to pick the algorithm itself.
pub const DEFAULT_COMPRESSION: u8 = 0xC0;
/// Plain Gorilla hint: no delta-delta, width recomputed.
pub const NO_COMPRESSION: u8 = 0x00;
/// Marks the Huffman family in packet descriptors.
pub const HUFFMAN_FLAG: u8 = 0x80;
/// The legacy LZ property descriptor.
pub const LEMPEL_ZIV: u8 = 0x80;

const FAMILY_MASK: u8 = 0xC0;
const INVALID_FAMILY: u8 = 0x40;
const DELTA_DELTA_FLAG: u8 = 0x20;
const LOW_BITS_MASK: u8 = 0x1F;

const PROPERTY_INT_FLAG: u8 = 0x40;
const PROPERTY_SHORT_FLAG: u8 = 0x20;
const PROPERTY_INT_INDEX_MASK: u8 = 0x3F;

/// First map index that encodes a bare bit width.
const DIRECT_INDEX_BASE: u8 = 24;
const DIRECT_INDEX_OFFSET: u8 = 8;

/// `(bit width, pad count)` for map indices `0..24`.
const PROPERTY_INDEX_MAP: [(u8, u8); 24] = [
    (8, 0),
    (1, 0),
    (1, 1),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (1, 6),
    (1, 7),
    (2, 0),
    (2, 1),
    (2, 2),
    (2, 3),
    (3, 0),
    (3, 1),
    (3, 2),
    (4, 0),
    (4, 1),
    (5, 0),
    (5, 1),
    (6, 0),
    (6, 1),
    (7, 0),
    (7, 1),
];

/// First map index for each bit width `1..=7` (slot 0 unused).
const PROPERTY_INDEX_OFFSETS: [u8; 8] = [0, 1, 9, 13, 16, 18, 20, 22];

/// Largest pad count each bit width `1..=7` can carry (slot 0 unused).
const PROPERTY_MAX_PADS: [u8; 8] = [0, 7, 3, 2, 1, 1, 1, 1];

//==================================================================================
// Packet Descriptors
//==================================================================================

/// The algorithm a packet payload was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketAlgorithm {
    /// Fixed-width packing; `bit_width` is in `1..=32`.
    Gorilla { bit_width: u8, delta_delta: bool },
    /// Bucketed Huffman over delta-delta residuals.
    Huffman { table_index: u8 },
}

impl PacketAlgorithm {
    pub fn to_byte(self) -> u8 {
        match self {
            PacketAlgorithm::Gorilla {
                bit_width,
                delta_delta,
            } => {
                let width = if bit_width >= 32 { 0 } else { bit_width };
                let dd = if delta_delta { DELTA_DELTA_FLAG } else { 0 };
                dd | (width & LOW_BITS_MASK)
            }
            PacketAlgorithm::Huffman { table_index } => HUFFMAN_FLAG | (table_index & LOW_BITS_MASK),
        }
    }

    /// Parses a descriptor read from a compressed buffer.
    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        match byte & FAMILY_MASK {
            0x00 => {
                let width = byte & LOW_BITS_MASK;
                Ok(PacketAlgorithm::Gorilla {
                    bit_width: if width == 0 { 32 } else { width },
                    delta_delta: byte & DELTA_DELTA_FLAG != 0,
                })
            }
            INVALID_FAMILY => Err(CodecError::MalformedInput(format!(
                "packet descriptor 0x{:02X} uses the reserved 01 family",
                byte
            ))),
            _ => Ok(PacketAlgorithm::Huffman {
                table_index: byte & LOW_BITS_MASK,
            }),
        }
    }
}

/// What a caller asked for when compressing packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketHint {
    /// Let the planner choose between Huffman and Gorilla.
    Default,
    /// Gorilla; the width is always recomputed.
    Gorilla { try_delta_delta: bool },
    /// Huffman with an explicit table.
    Huffman { table_index: u8 },
}

impl PacketHint {
    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        if byte == DEFAULT_COMPRESSION {
            return Ok(PacketHint::Default);
        }
        match byte & FAMILY_MASK {
            0x00 => Ok(PacketHint::Gorilla {
                try_delta_delta: byte & DELTA_DELTA_FLAG != 0,
            }),
            INVALID_FAMILY => Err(CodecError::InvalidArgument(format!(
                "algorithm hint 0x{:02X} is not a packet algorithm",
                byte
            ))),
            _ => Ok(PacketHint::Huffman {
                table_index: byte & LOW_BITS_MASK,
            }),
        }
    }
}

//==================================================================================
// Property Descriptors
//==================================================================================

/// Size of one property item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemWidth {
    Byte = 1,
    Short = 2,
    Int = 4,
}

impl ItemWidth {
    /// Widths in the order the planner tries them.
    pub const ALL: [ItemWidth; 3] = [ItemWidth::Int, ItemWidth::Short, ItemWidth::Byte];

    #[inline]
    pub fn bytes(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn bits(self) -> u8 {
        (self as u8) * 8
    }

    /// Smallest bit width a descriptor can express that is at least `bit_width`.
    ///
    /// Widths 9 to 15 have no map entry and round up to 16.
    pub fn representable_width(self, bit_width: u8) -> Result<u8, CodecError> {
        let width = match bit_width {
            0 => 1,
            1..=8 => bit_width,
            9..=16 => 16,
            _ => bit_width,
        };
        if width > self.bits() {
            return Err(CodecError::InvalidArgument(format!(
                "bit width {} does not fit {}-byte items",
                bit_width,
                self.bytes()
            )));
        }
        Ok(width)
    }
}

/// Parameters of a Gorilla-packed property payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLayout {
    pub item_width: ItemWidth,
    pub bit_width: u8,
    pub pad: u8,
}

impl PropertyLayout {
    /// The layout for `count` items at `bit_width`, with the pad count recomputed.
    pub fn for_items(item_width: ItemWidth, bit_width: u8, count: usize) -> Result<Self, CodecError> {
        let bit_width = item_width.representable_width(bit_width)?;
        let pad = crate::kernels::gorilla::pad_count(count, bit_width)?;
        Ok(Self {
            item_width,
            bit_width,
            pad,
        })
    }

    fn index(&self) -> Result<u8, CodecError> {
        match self.bit_width {
            1..=7 => {
                let w = self.bit_width as usize;
                if self.pad > PROPERTY_MAX_PADS[w] {
                    return Err(CodecError::InvalidArgument(format!(
                        "pad count {} is too large for {}-bit items",
                        self.pad, self.bit_width
                    )));
                }
                Ok(PROPERTY_INDEX_OFFSETS[w] + self.pad)
            }
            8 if self.pad == 0 => Ok(0),
            w if w >= 16 && self.pad == 0 && w <= self.item_width.bits() => {
                Ok(w + DIRECT_INDEX_OFFSET)
            }
            _ => Err(CodecError::InvalidArgument(format!(
                "no descriptor for {}-bit {}-byte items with pad {}",
                self.bit_width,
                self.item_width.bytes(),
                self.pad
            ))),
        }
    }

    fn from_index(item_width: ItemWidth, index: u8) -> Result<Self, CodecError> {
        let (bit_width, pad) = if index < DIRECT_INDEX_BASE {
            PROPERTY_INDEX_MAP[index as usize]
        } else {
            (index - DIRECT_INDEX_OFFSET, 0)
        };
        if bit_width > item_width.bits() {
            return Err(CodecError::MalformedInput(format!(
                "property map index {} means {} bits, too wide for {}-byte items",
                index,
                bit_width,
                item_width.bytes()
            )));
        }
        Ok(Self {
            item_width,
            bit_width,
            pad,
        })
    }
}

/// The algorithm a property payload was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyAlgorithm {
    Gorilla(PropertyLayout),
    LempelZiv,
}

impl PropertyAlgorithm {
    pub fn to_byte(self) -> Result<u8, CodecError> {
        match self {
            PropertyAlgorithm::LempelZiv => Ok(LEMPEL_ZIV),
            PropertyAlgorithm::Gorilla(layout) => {
                let index = layout.index()?;
                Ok(match layout.item_width {
                    ItemWidth::Int => PROPERTY_INT_FLAG | (index & PROPERTY_INT_INDEX_MASK),
                    ItemWidth::Short => PROPERTY_SHORT_FLAG | (index & LOW_BITS_MASK),
                    ItemWidth::Byte => index & LOW_BITS_MASK,
                })
            }
        }
    }

    /// Parses a descriptor read from a compressed property buffer.
    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        if byte == LEMPEL_ZIV {
            return Ok(PropertyAlgorithm::LempelZiv);
        }
        if byte & HUFFMAN_FLAG != 0 {
            return Err(CodecError::MalformedInput(format!(
                "property descriptor 0x{:02X} names no known algorithm",
                byte
            )));
        }
        let (item_width, index) = split_property_byte(byte);
        PropertyLayout::from_index(item_width, index).map(PropertyAlgorithm::Gorilla)
    }
}

fn split_property_byte(byte: u8) -> (ItemWidth, u8) {
    if byte & PROPERTY_INT_FLAG != 0 {
        (ItemWidth::Int, byte & PROPERTY_INT_INDEX_MASK)
    } else if byte & PROPERTY_SHORT_FLAG != 0 {
        (ItemWidth::Short, byte & LOW_BITS_MASK)
    } else {
        (ItemWidth::Byte, byte & LOW_BITS_MASK)
    }
}

/// What a caller asked for when compressing a property buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyHint {
    /// Try every item width and keep the smallest output.
    Default,
    /// Pack as `item_width` items at (at least) `bit_width` bits.
    Gorilla { item_width: ItemWidth, bit_width: u8 },
}

impl PropertyHint {
    pub fn from_byte(byte: u8) -> Result<Self, CodecError> {
        if byte == DEFAULT_COMPRESSION {
            return Ok(PropertyHint::Default);
        }
        if byte == LEMPEL_ZIV {
            return Err(CodecError::InvalidArgument(
                "LZ is a decode-only property format".to_string(),
            ));
        }
        if byte & HUFFMAN_FLAG != 0 {
            return Err(CodecError::InvalidArgument(format!(
                "algorithm hint 0x{:02X} is not a property algorithm",
                byte
            )));
        }
        let (item_width, index) = split_property_byte(byte);
        let layout = PropertyLayout::from_index(item_width, index).map_err(|_| {
            CodecError::InvalidArgument(format!(
                "algorithm hint 0x{:02X} names a bit width wider than its items",
                byte
            ))
        })?;
        Ok(PropertyHint::Gorilla {
            item_width,
            bit_width: layout.bit_width,
        })
    }
}

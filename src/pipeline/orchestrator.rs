// In: src/pipeline/orchestrator.rs

//! The top-level coordinator for compressing and decompressing buffers.
//!
//! A `Codec` turns a caller's algorithm hint into a concrete descriptor (with the
//! help of the `planner`), writes that descriptor followed by the kernel payload,
//! and on decode dispatches on the descriptor byte. It holds only immutable
//! state: the shared configuration and the custom Huffman tables registered on
//! this instance. All scratch state (bit cursors, delta-delta history) lives on
//! the stack of a single call, so one `Codec` can serve any number of threads.

use std::sync::{Arc, OnceLock};

use crate::config::{CodecConfig, SelectionPolicy};
use crate::error::CodecError;
use crate::kernels::gorilla::{self, PropertyPacker};
use crate::kernels::huffman::{self, HuffmanTable, DEFAULT_TABLE_COUNT};
use crate::kernels::lz;
use crate::pipeline::descriptor::{
    ItemWidth, PacketAlgorithm, PacketHint, PropertyAlgorithm, PropertyHint, PropertyLayout,
};
use crate::pipeline::planner;
use crate::utils::packed_byte_len;

/// Highest Huffman table index a descriptor can carry.
const MAX_TABLE_INDEX: usize = 0x1F;

static SHARED_CODEC: OnceLock<Codec> = OnceLock::new();

/// The packet and property codec.
#[derive(Debug, Clone)]
pub struct Codec {
    config: Arc<CodecConfig>,
    custom_tables: Vec<HuffmanTable>,
}

impl Default for Codec {
    fn default() -> Self {
        Self {
            config: Arc::new(CodecConfig::default()),
            custom_tables: Vec::new(),
        }
    }
}

impl Codec {
    /// A codec with the default configuration and no custom tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default codec used by the stateless API.
    pub fn shared() -> &'static Codec {
        SHARED_CODEC.get_or_init(Codec::new)
    }

    /// Builds a codec from `config`, registering its custom Huffman tables in order.
    pub fn with_config(config: Arc<CodecConfig>) -> Result<Self, CodecError> {
        let mut codec = Self {
            config: Arc::clone(&config),
            custom_tables: Vec::with_capacity(config.custom_huffman_tables.len()),
        };
        for widths in &config.custom_huffman_tables {
            codec.register_huffman_table(widths)?;
        }
        Ok(codec)
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Validates and registers a bucket table. Returns its descriptor index.
    pub fn register_huffman_table(&mut self, widths: &[u8]) -> Result<u8, CodecError> {
        let index = DEFAULT_TABLE_COUNT + self.custom_tables.len();
        if index > MAX_TABLE_INDEX {
            return Err(CodecError::InvalidArgument(format!(
                "at most {} custom Huffman tables can be registered",
                MAX_TABLE_INDEX + 1 - DEFAULT_TABLE_COUNT
            )));
        }
        self.custom_tables.push(HuffmanTable::from_widths(widths)?);
        log::debug!("codec: registered huffman table {} = {:?}", index, widths);
        Ok(index as u8)
    }

    fn huffman_table(&self, index: u8) -> Option<&HuffmanTable> {
        let index = index as usize;
        if index < DEFAULT_TABLE_COUNT {
            HuffmanTable::default_table(index)
        } else {
            self.custom_tables.get(index - DEFAULT_TABLE_COUNT)
        }
    }

    //==============================================================================
    // 1. Packet Streams
    //==============================================================================

    /// Compresses `samples`, writing the descriptor byte first.
    ///
    /// `algorithm_hint` is `0xC0` to let the codec choose, a Gorilla byte
    /// (`0x20` requests delta-delta, the width bits are ignored), or a Huffman
    /// byte naming a table.
    pub fn compress_packet_data(
        &self,
        samples: &[i32],
        algorithm_hint: u8,
    ) -> Result<Vec<u8>, CodecError> {
        if samples.is_empty() {
            return Err(CodecError::InvalidArgument(
                "cannot compress an empty sample buffer".to_string(),
            ));
        }

        let output = match PacketHint::from_byte(algorithm_hint)? {
            PacketHint::Default => match planner::best_default_huffman(samples) {
                Some(table_index) => {
                    let huffman = self.encode_huffman(samples, table_index)?;
                    self.settle_default(samples, huffman)?
                }
                None => self.encode_gorilla(samples, true)?,
            },
            PacketHint::Huffman { table_index } => {
                let huffman = self.encode_huffman(samples, table_index)?;
                if exceeds_legacy_ratio(huffman.len(), samples.len()) {
                    log::debug!(
                        "codec: huffman table {} spent {} bytes on {} samples, using gorilla",
                        table_index,
                        huffman.len(),
                        samples.len()
                    );
                    self.encode_gorilla(samples, true)?
                } else {
                    huffman
                }
            }
            PacketHint::Gorilla { try_delta_delta } => {
                self.encode_gorilla(samples, try_delta_delta)?
            }
        };
        Ok(output)
    }

    fn settle_default(&self, samples: &[i32], huffman: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        match self.config.packet_selection {
            SelectionPolicy::SmallestOutput => {
                let gorilla = self.encode_gorilla(samples, true)?;
                log::debug!(
                    "codec: huffman {} bytes vs gorilla {} bytes",
                    huffman.len(),
                    gorilla.len()
                );
                Ok(if huffman.len() < gorilla.len() {
                    huffman
                } else {
                    gorilla
                })
            }
            SelectionPolicy::LegacyRatio => {
                if exceeds_legacy_ratio(huffman.len(), samples.len()) {
                    self.encode_gorilla(samples, true)
                } else {
                    Ok(huffman)
                }
            }
        }
    }

    fn encode_huffman(&self, samples: &[i32], table_index: u8) -> Result<Vec<u8>, CodecError> {
        let table = self.huffman_table(table_index).ok_or_else(|| {
            CodecError::InvalidArgument(format!(
                "huffman table {} is not registered ({} available)",
                table_index,
                DEFAULT_TABLE_COUNT + self.custom_tables.len()
            ))
        })?;
        let mut output = Vec::with_capacity(1 + samples.len());
        output.push(PacketAlgorithm::Huffman { table_index }.to_byte());
        huffman::encode(table, samples, &mut output);
        Ok(output)
    }

    fn encode_gorilla(&self, samples: &[i32], try_delta_delta: bool) -> Result<Vec<u8>, CodecError> {
        let algorithm = planner::find_packet_algorithm(samples, try_delta_delta);
        let (bit_width, delta_delta) = match algorithm {
            PacketAlgorithm::Gorilla {
                bit_width,
                delta_delta,
            } => (bit_width, delta_delta),
            PacketAlgorithm::Huffman { .. } => {
                return Err(CodecError::InvalidArgument(
                    "planner returned a huffman descriptor for gorilla".to_string(),
                ))
            }
        };
        let mut output = Vec::with_capacity(1 + packed_byte_len(samples.len(), bit_width)?);
        output.push(algorithm.to_byte());
        gorilla::encode_packets(samples, bit_width, delta_delta, &mut output)?;
        Ok(output)
    }

    /// Decodes exactly `max_output_count` samples.
    ///
    /// Returns the number of input bytes consumed (descriptor included) and the
    /// samples. A count of zero reads only the descriptor.
    pub fn decompress_packet_data(
        &self,
        input: &[u8],
        max_output_count: usize,
    ) -> Result<(usize, Vec<i32>), CodecError> {
        let (&descriptor, payload) = input.split_first().ok_or_else(|| {
            CodecError::InvalidArgument("cannot decompress an empty buffer".to_string())
        })?;
        let algorithm = PacketAlgorithm::from_byte(descriptor)?;
        if max_output_count == 0 {
            return Ok((1, Vec::new()));
        }

        let decoded = match algorithm {
            PacketAlgorithm::Gorilla {
                bit_width,
                delta_delta,
            } => gorilla::decode_packets(payload, bit_width, delta_delta, max_output_count),
            PacketAlgorithm::Huffman { table_index } => match self.huffman_table(table_index) {
                Some(table) => huffman::decode(table, payload, max_output_count),
                None => Err(CodecError::MalformedInput(format!(
                    "descriptor names unregistered huffman table {}",
                    table_index
                ))),
            },
        };

        let (samples, consumed) = decoded.map_err(|e| {
            log::warn!("codec: rejected {:?} packet payload: {}", algorithm, e);
            e
        })?;
        Ok((1 + consumed, samples))
    }

    //==============================================================================
    // 2. Property Buffers
    //==============================================================================

    /// Compresses a property byte buffer, writing the descriptor byte first.
    ///
    /// `algorithm_hint` is `0xC0` to try every item width, or a Gorilla property
    /// descriptor whose item width and bit width are honored (the pad count is
    /// recomputed).
    pub fn compress_property_data(
        &self,
        bytes: &[u8],
        algorithm_hint: u8,
    ) -> Result<Vec<u8>, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::InvalidArgument(
                "cannot compress an empty property buffer".to_string(),
            ));
        }

        let layout = match PropertyHint::from_byte(algorithm_hint)? {
            PropertyHint::Default => planner::best_property_layout(bytes)?,
            PropertyHint::Gorilla {
                item_width,
                bit_width,
            } => planner::property_layout_for_hint(bytes, item_width, bit_width)?,
        };

        let count = bytes.len() / layout.item_width.bytes();
        let mut output = Vec::with_capacity(1 + packed_byte_len(count, layout.bit_width)?);
        output.push(PropertyAlgorithm::Gorilla(layout).to_byte()?);
        encode_items(bytes, &layout, &mut output)?;
        log::debug!(
            "codec: property of {} bytes -> {} bytes as {:?}",
            bytes.len(),
            output.len(),
            layout
        );
        Ok(output)
    }

    /// Decompresses a property buffer back to its item bytes.
    pub fn decompress_property_data(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (&descriptor, payload) = input.split_first().ok_or_else(|| {
            CodecError::InvalidArgument("cannot decompress an empty buffer".to_string())
        })?;
        let algorithm = PropertyAlgorithm::from_byte(descriptor)?;

        let decoded = match algorithm {
            PropertyAlgorithm::LempelZiv => lz::decompress(payload, self.config.max_property_items),
            PropertyAlgorithm::Gorilla(_) if payload.is_empty() => {
                Err(CodecError::truncated("a property payload"))
            }
            PropertyAlgorithm::Gorilla(layout) => {
                decode_items(payload, &layout, self.config.max_property_items)
            }
        };
        decoded.map_err(|e| {
            log::warn!("codec: rejected {:?} property payload: {}", algorithm, e);
            e
        })
    }
}

/// The historical fallback rule: more than four payload bytes per sample.
#[inline]
fn exceeds_legacy_ratio(encoded_len: usize, sample_count: usize) -> bool {
    (encoded_len.saturating_sub(1) >> 2) > sample_count
}

fn encode_items(bytes: &[u8], layout: &PropertyLayout, output: &mut Vec<u8>) -> Result<(), CodecError> {
    match layout.item_width {
        ItemWidth::Byte => PropertyPacker::<i8>::encode(bytes, layout.bit_width, output),
        ItemWidth::Short => PropertyPacker::<i16>::encode(bytes, layout.bit_width, output),
        ItemWidth::Int => PropertyPacker::<i32>::encode(bytes, layout.bit_width, output),
    }
}

fn decode_items(
    payload: &[u8],
    layout: &PropertyLayout,
    max_items: usize,
) -> Result<Vec<u8>, CodecError> {
    let max_bytes = max_items.saturating_mul(layout.item_width.bytes());
    match layout.item_width {
        ItemWidth::Byte => {
            PropertyPacker::<i8>::decode(payload, layout.bit_width, layout.pad, max_bytes)
        }
        ItemWidth::Short => {
            PropertyPacker::<i16>::decode(payload, layout.bit_width, layout.pad, max_bytes)
        }
        ItemWidth::Int => {
            PropertyPacker::<i32>::decode(payload, layout.bit_width, layout.pad, max_bytes)
        }
    }
}

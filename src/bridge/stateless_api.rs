// In: src/bridge/stateless_api.rs

use crate::bridge::format::{PropertyStats, SampleStats};
use crate::error::CodecError;
use crate::pipeline::descriptor::{PacketAlgorithm, PropertyAlgorithm};
use crate::pipeline::Codec;

/// Compresses a sample buffer with the process-wide default codec.
///
/// `algorithm_hint` is `0xC0` to let the codec choose; see
/// `Codec::compress_packet_data` for the other accepted values.
pub fn compress_samples(samples: &[i32], algorithm_hint: u8) -> Result<Vec<u8>, CodecError> {
    Codec::shared().compress_packet_data(samples, algorithm_hint)
}

/// Decodes exactly `max_output_count` samples. Returns `(consumed_bytes, samples)`.
pub fn decompress_samples(
    input: &[u8],
    max_output_count: usize,
) -> Result<(usize, Vec<i32>), CodecError> {
    Codec::shared().decompress_packet_data(input, max_output_count)
}

/// Compresses a property byte buffer with the process-wide default codec.
pub fn compress_property(bytes: &[u8], algorithm_hint: u8) -> Result<Vec<u8>, CodecError> {
    Codec::shared().compress_property_data(bytes, algorithm_hint)
}

/// Decompresses a property buffer back to its item bytes.
pub fn decompress_property(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    Codec::shared().decompress_property_data(input)
}

/// Reads the descriptor of a compressed sample buffer without decoding the payload.
pub fn analyze_samples(input: &[u8]) -> Result<SampleStats, CodecError> {
    let (&descriptor, payload) = input.split_first().ok_or_else(|| {
        CodecError::InvalidArgument("cannot analyze an empty buffer".to_string())
    })?;
    Ok(SampleStats {
        descriptor,
        algorithm: PacketAlgorithm::from_byte(descriptor)?,
        payload_size: payload.len(),
    })
}

/// Reads the descriptor of a compressed property buffer without decoding the payload.
pub fn analyze_property(input: &[u8]) -> Result<PropertyStats, CodecError> {
    let (&descriptor, payload) = input.split_first().ok_or_else(|| {
        CodecError::InvalidArgument("cannot analyze an empty buffer".to_string())
    })?;
    let algorithm = PropertyAlgorithm::from_byte(descriptor)?;

    let item_count = match algorithm {
        PropertyAlgorithm::LempelZiv => None,
        PropertyAlgorithm::Gorilla(layout) => {
            let slots = payload.len().saturating_mul(8) / layout.bit_width as usize;
            let count = slots.checked_sub(layout.pad as usize).ok_or_else(|| {
                CodecError::MalformedInput(format!(
                    "pad count {} exceeds the {} slots of the payload",
                    layout.pad, slots
                ))
            })?;
            Some(count)
        }
    };

    Ok(PropertyStats {
        descriptor,
        algorithm,
        payload_size: payload.len(),
        item_count,
    })
}

// In: src/bridge/format.rs

//! Defines the public-facing structures the bridge hands back when it inspects
//! a compressed buffer without decoding it.

use serde::{Deserialize, Serialize};

use crate::pipeline::descriptor::{PacketAlgorithm, PropertyAlgorithm};

/// The result of `analyze_samples`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SampleStats {
    /// The raw descriptor byte.
    pub descriptor: u8,
    /// The descriptor, parsed.
    pub algorithm: PacketAlgorithm,
    /// Bytes following the descriptor. For packet streams this may include
    /// bytes that belong to whatever the container stored next.
    pub payload_size: usize,
}

/// The result of `analyze_property`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PropertyStats {
    pub descriptor: u8,
    pub algorithm: PropertyAlgorithm,
    pub payload_size: usize,
    /// Item count implied by a Gorilla payload; `None` for LZ, whose output
    /// length is only known after decoding.
    pub item_count: Option<usize>,
}

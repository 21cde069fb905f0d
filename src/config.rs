// In: src/config.rs

//! The single source of truth for all inkpack codec configuration.
//!
//! This module defines the unified `CodecConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from a JSON document) and then
//! handed to a `Codec`, which keeps it as a shared, read-only `Arc<CodecConfig>`.
//!
//! Every field has a default, so an empty JSON object is a valid configuration and
//! `CodecConfig::default()` reproduces the behavior of the stateless API.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// How the orchestrator settles Huffman against Gorilla when the caller passes
/// the default hint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// **Default:** Encode both ways and keep Huffman only if it is no larger
    /// than the Gorilla encoding.
    #[default]
    SmallestOutput,

    /// Keep Huffman unless it spends more than four bytes per sample. This is the
    /// historical rule and can produce a Huffman payload larger than Gorilla.
    LegacyRatio,
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

/// The complete configuration of a `Codec`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Huffman-vs-Gorilla policy for the default packet hint.
    #[serde(default)]
    pub packet_selection: SelectionPolicy,

    /// Upper bound on the number of items a single property decode may produce.
    /// LZ payloads count one item per output byte.
    #[serde(default = "default_max_property_items")]
    pub max_property_items: usize,

    /// Extra Huffman bucket tables, registered in order as descriptor
    /// indices 8, 9, and so on.
    #[serde(default)]
    pub custom_huffman_tables: Vec<Vec<u8>>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            packet_selection: SelectionPolicy::default(),
            max_property_items: default_max_property_items(),
            custom_huffman_tables: Vec::new(),
        }
    }
}

impl CodecConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        Ok(config)
    }
}

/// Helper for `serde` to provide a default for `max_property_items`.
fn default_max_property_items() -> usize {
    16 * 1024 * 1024
}

// In: src/error.rs

//! This module defines the single, unified error type for the entire inkpack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every failure is local to the call that raised it: the call returns immediately
//! and no partially decoded buffer ever reaches the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    // =========================================================================
    // === Caller Errors (the request itself is unusable)
    // =========================================================================
    /// An empty buffer where a non-empty one is required, or an algorithm hint
    /// that is structurally inconsistent with the data it was given.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // =========================================================================
    // === Data Errors (the compressed bytes cannot be trusted)
    // =========================================================================
    /// The compressed input is truncated or corrupted.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A counter or size grew past what can be represented.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library while loading a `CodecConfig`.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl CodecError {
    /// Shorthand used by every decoder when a field runs past the end of its input.
    pub(crate) fn truncated(what: &str) -> Self {
        CodecError::MalformedInput(format!("unexpected end of input while reading {}", what))
    }
}

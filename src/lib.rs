//! This file is the root of the `inkpack` Rust crate.
//!
//! inkpack losslessly compresses channels of signed 32-bit pen samples and
//! fixed-width property buffers. Every compressed buffer starts with a one-byte
//! algorithm descriptor followed by the payload of one of the kernels:
//! fixed-width packing ("Gorilla", optionally over delta-delta residuals),
//! bucketed Huffman, or, for legacy property data, LZ (decode only).
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`pipeline`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the public surface: the stateless `bridge` functions, the
//!     configurable `Codec`, and the error type.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod error;
pub mod kernels;
pub mod pipeline;

pub mod traits;
mod utils;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{
    analyze_property, analyze_samples, compress_property, compress_samples, decompress_property,
    decompress_samples, PropertyStats, SampleStats,
};
pub use config::{CodecConfig, SelectionPolicy};
pub use error::CodecError;
pub use pipeline::{
    Codec, ItemWidth, PacketAlgorithm, PropertyAlgorithm, PropertyLayout, DEFAULT_COMPRESSION,
    LEMPEL_ZIV, NO_COMPRESSION,
};

// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the stable, stateless entry point of the inkpack library. Callers
// that do not need a custom configuration hand it already length-delimited buffers;
// it forwards them to the process-wide default `Codec`.
//
// Data Flow (Compression):
//
//   1. [Stateless API (compress_samples / compress_property)] -> Receives a buffer + hint
//         |
//         `-> calls `Codec::shared()` ->
//
//   2. [Pipeline (orchestrator + planner)] -> Resolves the hint to a descriptor
//         |
//         `-> runs the matching kernel (gorilla / huffman)
//
//   3. Returns `descriptor byte ++ payload`
//
//
// Data Flow (Decompression):
//
//   1. [Stateless API (decompress_samples / decompress_property)] -> Receives bytes
//         |
//         `-> the orchestrator parses the descriptor byte and dispatches to
//             gorilla / huffman / lz, bounded by the caller's count or the
//             configured item limit
//
//   2. Returns the decoded samples (plus bytes consumed) or item bytes
//
// ====================================================================================
pub mod format;
pub mod stateless_api;

// --- Low-Level Stateless API ---
pub use stateless_api::{
    analyze_property, analyze_samples, compress_property, compress_samples, decompress_property,
    decompress_samples,
};

// --- Inspection Structs ---
pub use format::{PropertyStats, SampleStats};

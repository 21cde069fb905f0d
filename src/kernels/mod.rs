// In: src/kernels/mod.rs

//! The pure, low-level compression kernels.
//!
//! Every kernel here works on plain slices and knows nothing about descriptor
//! bytes or algorithm selection; that is the job of the `pipeline` module.

pub mod bitstream;
pub mod delta_delta;
pub mod gorilla;
pub mod huffman;
pub mod lz;
pub mod multibyte;

pub use delta_delta::{DeltaDelta, Residual};
pub use huffman::HuffmanTable;

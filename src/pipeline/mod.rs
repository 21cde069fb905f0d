// In: src/pipeline/mod.rs

//! The descriptor-driven pipeline: plan, encode, and dispatch on decode.

pub mod descriptor;
pub mod orchestrator;
pub(crate) mod planner;

pub use descriptor::{
    ItemWidth, PacketAlgorithm, PacketHint, PropertyAlgorithm, PropertyHint, PropertyLayout,
    DEFAULT_COMPRESSION, LEMPEL_ZIV, NO_COMPRESSION,
};
pub use orchestrator::Codec;

#[cfg(test)]
mod orchestrator_tests;

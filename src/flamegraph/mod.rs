//! Flamegraph generation using the inferno library.
//!
//! This module converts call trees into folded stacks and interactive SVG
//! flamegraphs.

pub mod generator;

// Re-export main types
pub use generator::{generate_flamegraph, to_folded_lines, FlamegraphConfig};

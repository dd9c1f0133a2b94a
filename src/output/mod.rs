//! Output writers for reports, recordings and flamegraphs.
//!
//! This module handles:
//! - Plain-text tree reports (optionally colored)
//! - JSON recording files
//! - SVG flamegraph files

pub mod json;
pub mod schema;
pub mod svg;
pub mod text;

// Re-export main functions
pub use json::{read_recording, read_recording_file, write_recording};
pub use schema::{RecordingFile, SampleRecord};
pub use svg::write_svg;
pub use text::{format_duration, render_report, render_tree, RenderOptions, LOW_CONFIDENCE_MARKER};

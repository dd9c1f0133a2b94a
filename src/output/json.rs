//! JSON recording file writer and reader.
//!
//! Writes recordings to JSON files with proper formatting, and reads them
//! back for offline reports.

use super::schema::RecordingFile;
use crate::sampler::Recording;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a recording to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `recording` - Recording returned by `Sampler::stop`
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let recording = sampler.stop()?;
/// write_recording(&recording, "recording.json")?;
/// ```
pub fn write_recording(
    recording: &Recording,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing recording to: {}", output_path.display());

    validate_output_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &RecordingFile::from_recording(recording))
        .map_err(OutputError::SerializationFailed)?;

    info!(
        "Recording written successfully ({} samples, {} bytes)",
        recording.samples().len(),
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Read a recording file without converting it
///
/// **Public** - used by `validate` to report file metadata
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
/// * `OutputError::UnsupportedVersion` - Schema major version differs
pub fn read_recording_file(input_path: impl AsRef<Path>) -> Result<RecordingFile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading recording from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let parsed: RecordingFile = serde_json::from_reader(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;

    if !parsed.is_compatible() {
        return Err(OutputError::UnsupportedVersion(parsed.version));
    }

    debug!(
        "Recording loaded: version {}, {} samples",
        parsed.version,
        parsed.samples.len()
    );

    Ok(parsed)
}

/// Read a recording from a JSON file
pub fn read_recording(input_path: impl AsRef<Path>) -> Result<Recording, OutputError> {
    read_recording_file(input_path).map(RecordingFile::into_recording)
}

/// Validate that output path is writable
///
/// **Private** - shared with the SVG writer
pub(super) fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

pub(super) fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

//! Recording file schema.
//!
//! This module defines the structure of recording JSON files we write to
//! disk. Schema is versioned to allow future evolution; durations are stored
//! as integer microseconds.

use crate::sampler::{Frame, Recording, Sample};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level recording structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingFile {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the file was generated (RFC 3339)
    pub generated_at: String,

    /// Name of the sampled thread
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub period_us: u64,

    /// Wall-clock time from start to stop
    pub elapsed_us: u64,

    #[serde(default)]
    pub failed_ticks: u64,

    pub samples: Vec<SampleRecord>,
}

/// One stored stack snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Innermost call first
    pub frames: Vec<Frame>,
    pub duration_us: u64,
    pub offset_us: u64,
}

impl RecordingFile {
    /// Snapshot a recording under the current schema version
    pub fn from_recording(recording: &Recording) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            target: recording.target().map(str::to_string),
            period_us: micros(recording.period()),
            elapsed_us: micros(recording.elapsed()),
            failed_ticks: recording.failed_ticks(),
            samples: recording
                .samples()
                .iter()
                .map(|s| SampleRecord {
                    frames: s.frames().to_vec(),
                    duration_us: micros(s.duration()),
                    offset_us: micros(s.offset()),
                })
                .collect(),
        }
    }

    pub fn into_recording(self) -> Recording {
        let samples = self
            .samples
            .into_iter()
            .map(|s| {
                Sample::new(
                    s.frames,
                    Duration::from_micros(s.duration_us),
                    Duration::from_micros(s.offset_us),
                )
            })
            .collect();
        let recording = Recording::new(
            samples,
            Duration::from_micros(self.elapsed_us),
            Duration::from_micros(self.period_us),
        )
        .with_failed_ticks(self.failed_ticks);

        match self.target {
            Some(target) => recording.with_target(target),
            None => recording,
        }
    }

    /// Major version must match ours
    pub fn is_compatible(&self) -> bool {
        major(&self.version).is_some() && major(&self.version) == major(SCHEMA_VERSION)
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

fn major(version: &str) -> Option<u64> {
    version.split('.').next()?.parse().ok()
}

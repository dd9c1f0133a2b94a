//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while compiling glob patterns
#[derive(Error, Debug)]
pub enum GlobError {
    #[error("Invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to compile glob patterns: {0}")]
    Compile(#[from] regex::Error),
}

/// Errors raised by sampler misuse or setup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Sampler has not been started")]
    NotStarted,

    #[error("Sampler is already running")]
    AlreadyStarted,

    #[error("Sampler was stopped and cannot be reused; create a new one per session")]
    AlreadyStopped,

    #[error("Sampling period must be positive, got {0:?}")]
    InvalidPeriod(Duration),

    #[error("Sampling pool has no worker threads")]
    PoolUnavailable,
}

/// Errors raised while snapshotting a thread's stack
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Stack capture failed: {0}")]
    Failed(String),
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error("Minimum percentage must be within 0..=100, got {0}")]
    InvalidThreshold(f64),

    #[error("Invalid group definition: {0}")]
    InvalidGroup(String),
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Call tree has no time to render")]
    EmptyTree,

    #[error("Failed to render flamegraph: {0}")]
    Render(String),

    #[error("Generated SVG is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    #[error("Unsupported recording schema version: {0}")]
    UnsupportedVersion(String),
}

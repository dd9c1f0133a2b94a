//! Utility modules for configuration and error handling.

pub mod config;
pub mod error;

// Re-export commonly used types for convenience
pub use config::{load_config, DurationFormat, GroupConfig, ProfilerConfig};
pub use error::{CaptureError, ConfigError, FlamegraphError, GlobError, OutputError, SamplerError};

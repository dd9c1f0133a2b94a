//! Configuration and constants for the profiler.
//!
//! `ProfilerConfig` is the serializable surface (TOML files, CLI flags).
//! It is compiled into a [`crate::pipeline::Pipeline`] before any sampling
//! or rendering happens, so malformed values fail fast.

use super::error::{ConfigError, SamplerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default interval between two stack snapshots
pub const DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_millis(20);

/// Default width of the name column in the text report
pub const DEFAULT_COLUMN_WIDTH: usize = 60;

/// Upper bound on sampling pool worker threads
pub const MAX_POOL_THREADS: usize = 4;

/// Current recording file schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// How durations are printed in the text report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFormat {
    /// Absolute milliseconds, e.g. `120ms`
    #[default]
    Millis,
    /// Share of the recording's elapsed time, e.g. `12.5%`
    Percent,
}

/// A named bucket of time, matched by glob patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub label: String,
    pub patterns: Vec<String>,
}

/// Profiler configuration
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Sampling period in milliseconds
    pub period_ms: u64,

    /// Strip the non-branching prefix shared by every sample
    pub prune_top: bool,

    /// Order children by descending total time
    pub sort: bool,

    /// Fold subtrees whose share of total time is below this percentage
    pub min_percent: f64,

    /// Packages folded only when their whole subtree matches
    pub soft_collapse: Vec<String>,

    /// Packages always folded into a single leaf
    pub hard_collapse: Vec<String>,

    /// Named time buckets, in priority order
    pub groups: Vec<GroupConfig>,

    pub format: DurationFormat,

    /// Wrap report segments in ANSI color codes
    pub color: bool,

    /// Width of the name column in the text report
    pub column_width: usize,

    /// Number of hottest symbols to list (0 disables the section)
    pub hot_spots: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_SAMPLING_PERIOD.as_millis() as u64,
            prune_top: true,
            sort: true,
            min_percent: 0.0,
            soft_collapse: Vec::new(),
            hard_collapse: Vec::new(),
            groups: Vec::new(),
            format: DurationFormat::Millis,
            color: false,
            column_width: DEFAULT_COLUMN_WIDTH,
            hot_spots: 0,
        }
    }
}

impl ProfilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period_ms = period.as_millis() as u64;
        self
    }

    pub fn with_group(mut self, label: impl Into<String>, patterns: &[&str]) -> Self {
        self.groups.push(GroupConfig {
            label: label.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// Sampling period as a `Duration`
    ///
    /// # Errors
    /// * `SamplerError::InvalidPeriod` - period is zero
    pub fn period(&self) -> Result<Duration, SamplerError> {
        let period = Duration::from_millis(self.period_ms);
        if period.is_zero() {
            return Err(SamplerError::InvalidPeriod(period));
        }
        Ok(period)
    }

    /// Check scalar fields; glob patterns are checked when compiled
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.period()?;

        if !(0.0..=100.0).contains(&self.min_percent) {
            return Err(ConfigError::InvalidThreshold(self.min_percent));
        }

        for group in &self.groups {
            if group.label.trim().is_empty() {
                return Err(ConfigError::InvalidGroup("group label is empty".to_string()));
            }
            if group.patterns.is_empty() {
                return Err(ConfigError::InvalidGroup(format!(
                    "group {:?} has no patterns",
                    group.label
                )));
            }
        }

        Ok(())
    }
}

/// Load a profiler config from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Toml` - If TOML is invalid
/// * any validation error from [`ProfilerConfig::validate`]
///
/// # Example
/// ```ignore
/// let config = load_config("stackprobe.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ProfilerConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: ProfilerConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_toml_is_default() {
        let config: ProfilerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProfilerConfig::default());
        assert_eq!(config.period().unwrap(), DEFAULT_SAMPLING_PERIOD);
    }

    #[test]
    fn test_load_config_keeps_group_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
period_ms = 10
format = "percent"
soft_collapse = ["std.*"]

[[groups]]
label = "IO"
patterns = ["pkg.io.*"]

[[groups]]
label = "DB"
patterns = ["pkg.db.*", "sql.*"]
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.period_ms, 10);
        assert_eq!(config.format, DurationFormat::Percent);
        assert_eq!(config.groups[0].label, "IO");
        assert_eq!(config.groups[1].patterns.len(), 2);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = ProfilerConfig::new().with_period(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Sampler(SamplerError::InvalidPeriod(_)))
        ));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = ProfilerConfig {
            min_percent: 120.0,
            ..ProfilerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_group_without_patterns_rejected() {
        let config = ProfilerConfig::new().with_group("DB", &[]);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGroup(_))));
    }

    #[test]
    fn test_unknown_format_is_toml_error() {
        let result: Result<ProfilerConfig, _> = toml::from_str(r#"format = "seconds""#);
        assert!(result.is_err());
    }
}

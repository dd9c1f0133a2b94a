use crate::flamegraph::FlamegraphConfig;
use crate::utils::config::GroupConfig;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ReportArgs {
    /// Recording JSON file to report on
    pub input: PathBuf,

    /// Optional TOML config; flags below override it
    pub config: Option<PathBuf>,

    /// Print durations as a share of elapsed time
    pub percent: bool,

    pub color: bool,

    /// Keep the shared non-branching prefix
    pub no_prune: bool,

    /// Keep first-seen child order
    pub no_sort: bool,

    pub min_percent: Option<f64>,

    /// Extra soft-collapse patterns
    pub soft: Vec<String>,

    /// Extra hard-collapse patterns
    pub hard: Vec<String>,

    /// Group definitions, `LABEL=PATTERN[,PATTERN...]`
    pub groups: Vec<String>,

    /// Number of hottest symbols to list
    pub hot_spots: Option<usize>,

    /// Output path for SVG flamegraph (optional)
    pub flamegraph: Option<PathBuf>,

    /// Flamegraph configuration
    pub flamegraph_config: Option<FlamegraphConfig>,
}

/// Arguments for the demo command
#[derive(Debug, Clone)]
pub struct DemoArgs {
    /// Where to write the recording
    pub output: PathBuf,

    /// Optional TOML config; supplies the period and report settings
    pub config: Option<PathBuf>,

    /// Overrides the config's `period_ms`
    pub period_ms: Option<u64>,

    /// Workload iterations; each takes roughly 15ms
    pub rounds: usize,

    /// Print the default report after recording
    pub print_report: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            output: PathBuf::from("recording.json"),
            config: None,
            period_ms: None,
            rounds: 20,
            print_report: false,
        }
    }
}

/// Parse a `LABEL=PATTERN[,PATTERN...]` group flag
pub fn parse_group(spec: &str) -> Result<GroupConfig> {
    let Some((label, patterns)) = spec.split_once('=') else {
        bail!("Group must look like LABEL=PATTERN[,PATTERN...], got {:?}", spec);
    };

    let label = label.trim();
    if label.is_empty() {
        bail!("Group label cannot be empty in {:?}", spec);
    }

    let patterns: Vec<String> = patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if patterns.is_empty() {
        bail!("Group {:?} has no patterns", label);
    }

    Ok(GroupConfig {
        label: label.to_string(),
        patterns,
    })
}

//! Configuration compiled into a ready-to-run report pipeline.
//!
//! A [`Pipeline`] owns compiled globs and group specs, so applying it to many
//! recordings never re-parses patterns. Transformations run in a fixed order:
//! collapse, threshold collapse, prune, sort.

use crate::aggregator::{aggregate_groups, calculate_hot_spots, GroupSpec, GroupTotals, HotSpot};
use crate::output::{render_report, RenderOptions};
use crate::pattern::Glob;
use crate::sampler::{profile, Recording, Sampler};
use crate::tree::{collapse, collapse_below, prune_top, sort, CallTree};
use crate::utils::config::ProfilerConfig;
use crate::utils::error::{ConfigError, SamplerError};
use log::debug;
use std::time::Duration;

/// Compiled configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub period: Duration,
    pub soft: Glob,
    pub hard: Glob,
    pub groups: GroupSpec,
    pub prune_top: bool,
    pub sort: bool,
    pub min_percent: f64,
    pub hot_spots: usize,
    pub render: RenderOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            period: crate::utils::config::DEFAULT_SAMPLING_PERIOD,
            soft: Glob::empty(),
            hard: Glob::empty(),
            groups: GroupSpec::new(),
            prune_top: true,
            sort: true,
            min_percent: 0.0,
            hot_spots: 0,
            render: RenderOptions::default(),
        }
    }
}

/// Everything a report shows, plus the tree it was rendered from
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub tree: CallTree,
    pub groups: GroupTotals,
    pub hot_spots: Vec<HotSpot>,
    pub lines: Vec<String>,
}

impl Pipeline {
    /// Validate and compile a config
    ///
    /// # Errors
    /// * `ConfigError::Sampler` - Sampling period is zero
    /// * `ConfigError::InvalidThreshold` - `min_percent` outside 0..=100
    /// * `ConfigError::InvalidGroup` - Group without label or patterns
    /// * `ConfigError::Glob` - Malformed collapse or group pattern
    pub fn from_config(config: &ProfilerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let pipeline = Self {
            period: config.period()?,
            soft: Glob::new(&config.soft_collapse)?,
            hard: Glob::new(&config.hard_collapse)?,
            groups: GroupSpec::from_config(&config.groups)?,
            prune_top: config.prune_top,
            sort: config.sort,
            min_percent: config.min_percent,
            hot_spots: config.hot_spots,
            render: RenderOptions::from_config(config),
        };
        debug!(
            "Compiled pipeline: {} soft, {} hard, {} group(s)",
            pipeline.soft.patterns().len(),
            pipeline.hard.patterns().len(),
            pipeline.groups.labels().count()
        );
        Ok(pipeline)
    }

    /// Unstarted sampler for the calling thread at the configured period
    pub fn sampler(&self) -> Result<Sampler, SamplerError> {
        Sampler::new(self.period)
    }

    /// Run `f` on the calling thread, sampled at the configured period
    pub fn profile<R>(&self, f: impl FnOnce() -> R) -> Result<(R, Recording), SamplerError> {
        profile(self.period, f)
    }

    /// Apply the configured transformations; the input is left untouched
    pub fn apply(&self, tree: &CallTree) -> CallTree {
        let mut tree = collapse(tree, &self.soft, &self.hard);
        tree = collapse_below(&tree, self.min_percent);
        if self.prune_top {
            tree = prune_top(&tree);
        }
        if self.sort {
            tree = sort(&tree);
        }
        tree
    }

    /// Build, transform, aggregate and render a recording
    pub fn report(&self, recording: &Recording) -> Report {
        self.report_tree(&recording.call_tree())
    }

    pub fn report_tree(&self, tree: &CallTree) -> Report {
        let tree = self.apply(tree);
        let groups = aggregate_groups(&tree, &self.groups);
        let hot_spots = if self.hot_spots > 0 {
            calculate_hot_spots(&tree, self.hot_spots)
        } else {
            Vec::new()
        };
        let lines = render_report(&tree, Some(&groups), &hot_spots, &self.render);

        Report {
            tree,
            groups,
            hot_spots,
            lines,
        }
    }
}

impl ProfilerConfig {
    /// Shorthand for [`Pipeline::from_config`]
    pub fn compile(&self) -> Result<Pipeline, ConfigError> {
        Pipeline::from_config(self)
    }
}

//! Named time buckets ("time in the database", "time in JSON", ...).
//!
//! Aggregation walks the tree depth-first. At each node the groups are tried
//! in their declared order and the first match wins; a matched node's total is
//! credited to that group and its subtree is not visited, so a shallower match
//! always beats a deeper one and nothing is counted twice.

use crate::pattern::Glob;
use crate::tree::{CallTree, Node};
use crate::utils::config::GroupConfig;
use crate::utils::error::GlobError;
use log::debug;
use std::time::Duration;

/// Ordered label -> glob mapping; earlier groups take priority
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSpec {
    groups: Vec<(String, Glob)>,
}

impl GroupSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, label: impl Into<String>, glob: Glob) -> Self {
        self.groups.push((label.into(), glob));
        self
    }

    /// Compile group definitions from config
    pub fn from_config(groups: &[GroupConfig]) -> Result<Self, GlobError> {
        let mut spec = Self::new();
        for group in groups {
            spec = spec.with_group(group.label.clone(), Glob::new(&group.patterns)?);
        }
        Ok(spec)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(label, _)| label.as_str())
    }

    /// Index of the first group matching `symbol`
    fn classify(&self, symbol: &str) -> Option<usize> {
        self.groups.iter().position(|(_, glob)| glob.matches(symbol))
    }
}

/// Per-group totals, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTotals {
    totals: Vec<(String, Duration)>,
}

impl GroupTotals {
    pub fn get(&self, label: &str) -> Option<Duration> {
        self.totals
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.totals.iter().map(|(l, t)| (l.as_str(), *t))
    }

    /// Groups that received any time
    pub fn nonzero(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.iter().filter(|(_, total)| !total.is_zero())
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Compute group totals for a tree
pub fn aggregate_groups(tree: &CallTree, spec: &GroupSpec) -> GroupTotals {
    let mut totals: Vec<Duration> = vec![Duration::ZERO; spec.groups.len()];
    if !spec.is_empty() {
        for root in tree.roots() {
            accumulate(root, spec, &mut totals);
        }
    }

    let totals = spec
        .groups
        .iter()
        .zip(totals)
        .map(|((label, _), total)| (label.clone(), total))
        .collect::<Vec<_>>();

    debug!("Aggregated {} group(s)", totals.len());
    GroupTotals { totals }
}

fn accumulate(node: &Node, spec: &GroupSpec, totals: &mut [Duration]) {
    match spec.classify(node.symbol()) {
        Some(group) => totals[group] += node.total_time(),
        None => {
            for child in node.children() {
                accumulate(child, spec, totals);
            }
        }
    }
}

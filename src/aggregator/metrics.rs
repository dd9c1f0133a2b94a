//! Calculate hot spots from a call tree.
//!
//! Hot spots are the symbols with the most own time, summed over every place
//! they appear in the tree. They are the primary targets for optimization.

use crate::tree::CallTree;
use log::debug;
use std::collections::HashMap;
use std::time::Duration;

/// One symbol ranked by own time
#[derive(Debug, Clone, PartialEq)]
pub struct HotSpot {
    pub symbol: String,

    /// Own time summed across all tree positions
    pub own_time: Duration,

    /// Share of the session's elapsed time
    pub percentage: f64,

    /// Samples that ended in this symbol's frames
    pub occurrences: u64,
}

/// Calculate the `top_n` hottest symbols
///
/// Sorted by own time (descending); ties keep first-seen order.
pub fn calculate_hot_spots(tree: &CallTree, top_n: usize) -> Vec<HotSpot> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_symbol: HashMap<&str, (Duration, u64)> = HashMap::new();

    for (_, node) in tree.walk() {
        if node.own_time().is_zero() {
            continue;
        }
        let leaf_samples = node
            .occurrences()
            .saturating_sub(node.children().iter().map(|c| c.occurrences()).sum());
        let entry = by_symbol.entry(node.symbol()).or_insert_with(|| {
            order.push(node.symbol());
            (Duration::ZERO, 0)
        });
        entry.0 += node.own_time();
        entry.1 += leaf_samples;
    }

    let mut spots: Vec<HotSpot> = order
        .into_iter()
        .filter_map(|symbol| {
            by_symbol.get(symbol).map(|&(own_time, occurrences)| HotSpot {
                symbol: symbol.to_string(),
                own_time,
                percentage: tree.percent_of(own_time),
                occurrences,
            })
        })
        .collect();

    spots.sort_by(|a, b| b.own_time.cmp(&a.own_time));
    spots.truncate(top_n);

    debug!("Calculated {} hot spot(s)", spots.len());
    spots
}

/// Summary statistics for a tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSummary {
    pub sample_count: usize,
    pub node_count: usize,
    pub max_depth: usize,
    pub elapsed: Duration,

    /// Time covered by samples; the remainder was idle or unobserved
    pub sampled_time: Duration,
}

impl TreeSummary {
    pub fn of(tree: &CallTree) -> Self {
        let mut summary = Self {
            sample_count: tree.sample_count(),
            elapsed: tree.total_time(),
            sampled_time: tree.roots().iter().map(|r| r.total_time()).sum(),
            ..Self::default()
        };
        for (depth, _) in tree.walk() {
            summary.node_count += 1;
            summary.max_depth = summary.max_depth.max(depth + 1);
        }
        summary
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Samples: {} | Nodes: {} | Depth: {} | Sampled: {}ms of {}ms",
            self.sample_count,
            self.node_count,
            self.max_depth,
            self.sampled_time.as_millis(),
            self.elapsed.as_millis()
        )
    }
}

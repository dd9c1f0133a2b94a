//! Aggregation of call trees into summaries.
//!
//! This module turns a (transformed) call tree into:
//! - Group totals (time per named bucket)
//! - Collapsed stack format (for flamegraph generation)
//! - Hot spot analysis (top own-time consumers)

pub mod groups;
pub mod metrics;
pub mod stack_builder;

// Re-export main types and functions
pub use groups::{aggregate_groups, GroupSpec, GroupTotals};
pub use metrics::{calculate_hot_spots, HotSpot, TreeSummary};
pub use stack_builder::{build_collapsed_stacks, CollapsedStack};

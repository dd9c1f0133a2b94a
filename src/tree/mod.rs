//! Call tree construction and transformation.
//!
//! - `model`: immutable `CallTree` / `Node`
//! - `builder`: samples -> merged tree
//! - `transform`: prune, collapse, threshold folding, sort

pub mod builder;
pub mod model;
pub mod transform;

// Re-export main types and functions
pub use builder::build_call_tree;
pub use model::{CallTree, Node, Walk};
pub use transform::{by_total_time_desc, collapse, collapse_below, prune_top, sort, sort_by};

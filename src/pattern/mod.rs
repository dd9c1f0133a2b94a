//! Glob matching over fully-qualified symbol names.
//!
//! Every tree transformation and the group aggregator select nodes with a
//! [`Glob`], so this module sits at the bottom of the dependency graph.

pub mod glob;

pub use glob::Glob;

//! stackprobe
//!
//! An embedded sampling profiler. Start a [`Sampler`] around a region of code,
//! stop it to get a [`Recording`], and turn that into a merged call tree and
//! a text report.
//!
//! Code under profile names its call-sites with [`frame!`]; a background pool
//! snapshots those per-thread stacks at a fixed period.
//!
//! ## Getting Started
//!
//! ```ignore
//! use std::time::Duration;
//!
//! let (_, recording) = stackprobe::profile(Duration::from_millis(5), || {
//!     let _main = stackprobe::frame!("app.Main.run");
//!     work();
//! })?;
//!
//! let report = stackprobe::ProfilerConfig::default().compile()?.report(&recording);
//! for line in report.lines {
//!     println!("{}", line);
//! }
//! ```
//!
//! The `stackprobe` binary reports on recordings saved with
//! [`output::write_recording`].

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod output;
pub mod pattern;
pub mod pipeline;
pub mod sampler;
pub mod tree;
pub mod utils;

pub use pattern::Glob;
pub use pipeline::{Pipeline, Report};
pub use sampler::{enter, profile, Frame, FrameGuard, Recording, Sample, Sampler};
pub use tree::{build_call_tree, CallTree, Node};
pub use utils::config::ProfilerConfig;

//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod demo;
pub mod models;
pub mod report;
pub mod utils;

// Re-export main command functions
pub use demo::{execute_demo, run_workload};
pub use models::{parse_group, DemoArgs, ReportArgs};
pub use report::{build_config, execute_report, validate_args};
pub use utils::{display_schema, display_version, validate_recording_file};

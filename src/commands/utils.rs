use crate::aggregator::TreeSummary;
use crate::output::read_recording_file;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::Path;

/// Validate a recording JSON file
pub fn validate_recording_file(file_path: &Path) -> Result<()> {
    println!("Validating recording: {}", file_path.display());

    let file = read_recording_file(file_path)
        .with_context(|| format!("Invalid recording {}", file_path.display()))?;

    println!("✓ Valid recording JSON");
    println!("  Version: {}", file.version);
    println!("  Generated: {}", file.generated_at);
    println!("  Thread: {}", file.target.as_deref().unwrap_or("<unknown>"));
    println!("  Period: {}us", file.period_us);
    println!("  Failed ticks: {}", file.failed_ticks);

    let summary = TreeSummary::of(&file.into_recording().call_tree());
    println!("  {}", summary.summary());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("stackprobe Recording Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string     - RFC 3339 timestamp");
        println!("  target: string?          - Name of the sampled thread");
        println!("  period_us: number        - Sampling period in microseconds");
        println!("  elapsed_us: number       - Session wall-clock time");
        println!("  failed_ticks: number     - Ticks whose capture failed");
        println!("  samples: array           - Stack snapshots in capture order");
        println!("    frames: array          - Innermost call first");
        println!("      symbol: string       - Fully-qualified name");
        println!("      file: string?        - Source file");
        println!("      line: number?        - Source line");
        println!("    duration_us: number    - Time since the previous sample");
        println!("    offset_us: number      - Time since sampling started");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("stackprobe v{}", env!("CARGO_PKG_VERSION"));
    println!("Recording Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("An embedded sampling profiler for Rust code regions.");
}

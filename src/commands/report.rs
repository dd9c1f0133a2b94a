//! Report command implementation.
//!
//! The report command:
//! 1. Loads a recording file
//! 2. Builds the profiler config (TOML file, then flag overrides)
//! 3. Runs the pipeline: tree, transformations, groups, hot spots
//! 4. Prints the text report
//! 5. Writes a flamegraph if requested

use super::models::{parse_group, ReportArgs};
use crate::flamegraph::{generate_flamegraph, FlamegraphConfig};
use crate::output::{read_recording, write_svg};
use crate::utils::config::{load_config, DurationFormat, ProfilerConfig};
use crate::utils::error::FlamegraphError;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Recording file missing, malformed, or from an unsupported schema
/// * Invalid config file or flags
/// * File write errors for the flamegraph
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/4: Loading recording {}", args.input.display());
    let recording = read_recording(&args.input)
        .with_context(|| format!("Failed to read recording {}", args.input.display()))?;
    debug!(
        "Recording: {} samples, {}ms elapsed, {} failed tick(s)",
        recording.samples().len(),
        recording.elapsed().as_millis(),
        recording.failed_ticks()
    );

    info!("Step 2/4: Compiling configuration...");
    let config = build_config(&args)?;
    let pipeline = config.compile().context("Invalid profiler configuration")?;

    info!("Step 3/4: Building call tree...");
    let report = pipeline.report(&recording);

    for line in &report.lines {
        println!("{}", line);
    }

    if let Some(svg_path) = &args.flamegraph {
        info!("Step 4/4: Generating flamegraph...");
        let mut fg_config = args.flamegraph_config.clone().unwrap_or_default();
        if fg_config.subtitle.is_none() {
            if let Some(target) = recording.target() {
                fg_config = fg_config.with_subtitle(format!("thread {}", target));
            }
        }

        match generate_flamegraph(&report.tree, Some(&fg_config)) {
            Ok(svg) => {
                write_svg(&svg, svg_path).context("Failed to write flamegraph SVG")?;
                info!("✓ Flamegraph written to: {}", svg_path.display());
            }
            Err(FlamegraphError::EmptyTree) => {
                warn!("Recording has no sampled time; skipping flamegraph");
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to generate flamegraph")),
        }
    } else {
        info!("Step 4/4: Skipping flamegraph generation (not requested)");
    }

    info!(
        "Report completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Merge the optional TOML config with command-line overrides
///
/// **Public** - exposed for tests and embedders
pub fn build_config(args: &ReportArgs) -> Result<ProfilerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProfilerConfig::default(),
    };

    if args.percent {
        config.format = DurationFormat::Percent;
    }
    if args.color {
        config.color = true;
    }
    if args.no_prune {
        config.prune_top = false;
    }
    if args.no_sort {
        config.sort = false;
    }
    if let Some(min_percent) = args.min_percent {
        config.min_percent = min_percent;
    }
    if let Some(hot_spots) = args.hot_spots {
        config.hot_spots = hot_spots;
    }
    config.soft_collapse.extend(args.soft.iter().cloned());
    config.hard_collapse.extend(args.hard.iter().cloned());
    for group in &args.groups {
        config.groups.push(parse_group(group)?);
    }

    Ok(config)
}

/// Validate report arguments
///
/// **Public** - can be called before execute_report for early validation
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        bail!("Input recording path cannot be empty");
    }

    if let Some(hot_spots) = args.hot_spots {
        if hot_spots > 1000 {
            bail!("hot_spots is too large (max 1000)");
        }
    }

    if let Some(FlamegraphConfig { width, .. }) = &args.flamegraph_config {
        if *width == 0 {
            bail!("Flamegraph width must be greater than 0");
        }
    }

    Ok(())
}

//! Demo command: profile a small built-in workload.
//!
//! The workload marks its call-sites with `frame!`, so the recording shows a
//! realistic mix of CPU work (`demo.parse.*`), blocking I/O (`demo.io.*`) and
//! a frame that is only occasionally sampled (`demo.Report.flush`).

use super::models::DemoArgs;
use crate::frame;
use crate::output::write_recording;
use crate::pipeline::Pipeline;
use crate::sampler::Recording;
use crate::utils::config::{load_config, ProfilerConfig};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

/// Execute the demo command
///
/// **Public** - main entry point called from main.rs
pub fn execute_demo(args: DemoArgs) -> Result<()> {
    validate_args(&args)?;

    let pipeline = build_config(&args)?
        .compile()
        .context("Invalid profiler configuration")?;
    info!(
        "Profiling {} demo round(s) every {}ms...",
        args.rounds,
        pipeline.period.as_millis()
    );

    let recording = run_workload(&pipeline, args.rounds)?;
    info!(
        "Captured {} samples over {}ms",
        recording.samples().len(),
        recording.elapsed().as_millis()
    );

    write_recording(&recording, &args.output).context("Failed to write recording JSON")?;
    info!("✓ Recording written to: {}", args.output.display());

    if args.print_report {
        for line in pipeline.report(&recording).lines {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Config file first, then the `--period-ms` override
fn build_config(args: &DemoArgs) -> Result<ProfilerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProfilerConfig::default(),
    };
    if let Some(period_ms) = args.period_ms {
        debug!("Period overridden to {}ms", period_ms);
        config.period_ms = period_ms;
    }
    Ok(config)
}

/// Profile the demo workload on the calling thread at the pipeline's period
pub fn run_workload(pipeline: &Pipeline, rounds: usize) -> Result<Recording> {
    let (checksum, recording) = pipeline.profile(|| {
        let _main = frame!("demo.Main.run");
        let mut checksum = 0u64;
        for round in 0..rounds {
            checksum = checksum.wrapping_add(parse(round as u64));
            store(round);
            if round % 8 == 7 {
                flush();
            }
        }
        checksum
    })
    .context("Failed to run sampler")?;

    info!("Workload checksum: {:#x}", checksum);
    Ok(recording)
}

fn parse(seed: u64) -> u64 {
    let _frame = frame!("demo.parse.Tokenizer.scan");
    let mut acc = seed;
    for _ in 0..4 {
        acc = acc.wrapping_add(hash_block(acc));
    }
    acc
}

fn hash_block(seed: u64) -> u64 {
    let _frame = frame!("demo.parse.Hasher.block");
    spin(Duration::from_millis(2), seed)
}

fn store(round: usize) {
    let _frame = frame!("demo.io.Store.write");
    thread::sleep(Duration::from_millis(2));
    send(round);
}

fn send(_round: usize) {
    let _frame = frame!("demo.io.Socket.send");
    thread::sleep(Duration::from_millis(5));
}

fn flush() {
    let _frame = frame!("demo.Report.flush");
    thread::sleep(Duration::from_millis(1));
}

/// Burn CPU for about `budget`
fn spin(budget: Duration, seed: u64) -> u64 {
    let start = Instant::now();
    let mut x = seed | 1;
    while start.elapsed() < budget {
        // xorshift
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        x = black_box(x);
    }
    x
}

fn validate_args(args: &DemoArgs) -> Result<()> {
    if args.period_ms == Some(0) {
        bail!("Sampling period must be greater than 0");
    }
    if args.rounds == 0 {
        bail!("rounds must be greater than 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::read_recording;

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&DemoArgs::default()).is_ok());
        assert!(validate_args(&DemoArgs {
            period_ms: Some(0),
            ..DemoArgs::default()
        })
        .is_err());
        assert!(validate_args(&DemoArgs {
            rounds: 0,
            ..DemoArgs::default()
        })
        .is_err());
    }

    #[test]
    fn test_demo_writes_recording() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("demo.json");

        execute_demo(DemoArgs {
            output: output.clone(),
            period_ms: Some(2),
            rounds: 4,
            ..DemoArgs::default()
        })
        .unwrap();

        let recording = read_recording(&output).unwrap();
        assert!(recording.sampled_time() <= recording.elapsed());
        let tree = recording.call_tree();
        for root in tree.roots() {
            assert_eq!(root.symbol(), "demo.Main.run");
        }
    }

    #[test]
    fn test_demo_period_comes_from_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = temp_dir.path().join("stackprobe.toml");
        std::fs::write(&config, "period_ms = 7\n").unwrap();
        let output = temp_dir.path().join("demo.json");

        execute_demo(DemoArgs {
            output: output.clone(),
            config: Some(config.clone()),
            rounds: 1,
            ..DemoArgs::default()
        })
        .unwrap();
        let recording = read_recording(&output).unwrap();
        assert_eq!(recording.period(), Duration::from_millis(7));

        execute_demo(DemoArgs {
            output: output.clone(),
            config: Some(config),
            period_ms: Some(3),
            rounds: 1,
            ..DemoArgs::default()
        })
        .unwrap();
        let recording = read_recording(&output).unwrap();
        assert_eq!(recording.period(), Duration::from_millis(3));
    }
}

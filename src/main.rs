//! stackprobe CLI
//!
//! Reports on sampled call-tree recordings, renders flamegraphs and runs a
//! built-in demo workload.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use stackprobe::commands::{
    display_schema, display_version, execute_demo, execute_report, validate_args,
    validate_recording_file, DemoArgs, ReportArgs,
};
use stackprobe::flamegraph::FlamegraphConfig;

/// stackprobe - embedded sampling profiler
#[derive(Parser, Debug)]
#[command(name = "stackprobe")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the call tree report for a recording
    Report {
        /// Recording JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// TOML profiler config; flags override its values
        #[arg(short, long, env = "STACKPROBE_CONFIG")]
        config: Option<PathBuf>,

        /// Show durations as a percentage of elapsed time
        #[arg(long)]
        percent: bool,

        /// Color the report with ANSI escape codes
        #[arg(long)]
        color: bool,

        /// Keep the shared non-branching prefix
        #[arg(long)]
        no_prune: bool,

        /// Keep first-seen child order
        #[arg(long)]
        no_sort: bool,

        /// Fold subtrees below this share of elapsed time
        #[arg(long)]
        min_percent: Option<f64>,

        /// Soft-collapse pattern (repeatable)
        #[arg(long = "soft")]
        soft: Vec<String>,

        /// Hard-collapse pattern (repeatable)
        #[arg(long = "hard")]
        hard: Vec<String>,

        /// Group definition LABEL=PATTERN[,PATTERN...] (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Number of hottest symbols to list
        #[arg(long)]
        hot_spots: Option<usize>,

        /// Output path for SVG flamegraph (optional)
        #[arg(short, long)]
        flamegraph: Option<PathBuf>,

        /// Flamegraph title
        #[arg(long)]
        title: Option<String>,

        /// Flamegraph width in pixels
        #[arg(long, default_value = "1200")]
        width: usize,
    },

    /// Validate a recording JSON file
    Validate {
        /// Path to recording JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Profile a built-in workload and write its recording
    Demo {
        /// Output path for the recording
        #[arg(short, long, default_value = "recording.json")]
        output: PathBuf,

        /// TOML profiler config for the period and the printed report
        #[arg(short, long, env = "STACKPROBE_CONFIG")]
        config: Option<PathBuf>,

        /// Sampling period in milliseconds; overrides the config
        #[arg(long)]
        period_ms: Option<u64>,

        /// Workload iterations
        #[arg(long, default_value = "20")]
        rounds: usize,

        /// Print the report after recording
        #[arg(long)]
        report: bool,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Report {
            input,
            config,
            percent,
            color,
            no_prune,
            no_sort,
            min_percent,
            soft,
            hard,
            groups,
            hot_spots,
            flamegraph,
            title,
            width,
        } => {
            let fg_config = flamegraph.as_ref().map(|_| {
                let mut config = FlamegraphConfig::new();
                if let Some(title) = title {
                    config = config.with_title(title);
                }
                config.width = width;
                config
            });

            let args = ReportArgs {
                input,
                config,
                percent,
                color,
                no_prune,
                no_sort,
                min_percent,
                soft,
                hard,
                groups,
                hot_spots,
                flamegraph,
                flamegraph_config: fg_config,
            };

            validate_args(&args)?;
            execute_report(args)?;
        }

        Commands::Validate { file } => {
            validate_recording_file(&file)?;
        }

        Commands::Demo {
            output,
            config,
            period_ms,
            rounds,
            report,
        } => {
            execute_demo(DemoArgs {
                output,
                config,
                period_ms,
                rounds,
                print_report: report,
            })?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

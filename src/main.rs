//! # Build Benchmark Suite - Main Entry Point
//!
//! Orchestrates one benchmark sweep: parse the command line, pick the
//! experiment's workload grid, and run every case through both build tools
//! (`tdfs` and `docker`), recording one CSV row per run.
//!
//! ## Error Handling
//!
//! Failed build invocations never abort a sweep; they surface as empty log
//! text and all-zero metric rows so no data point is lost. Only
//! resource-level failures (fixture generation, results file writes)
//! terminate the process with an error.

use anyhow::Result;
use build_benchmark::logging::ColorizedFormatter;
use build_benchmark::{Args, SweepConfig, SweepRunner};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log level defaults to info for sweep progress; RUST_LOG overrides,
    // and -v raises the default to debug.
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .event_format(ColorizedFormatter)
        .init();

    info!("Build Benchmark Suite v{}", build_benchmark::VERSION);
    info!(
        "experiment={} output={:?} repeat={} cooldown={}s",
        args.experiment, args.output_file, args.repeat, args.cooldown
    );

    let config = SweepConfig::from_args(&args);
    let table = SweepRunner::new(config).run().await?;

    info!(
        "sweep complete: {} runs recorded to {:?}",
        table.len(),
        args.output_file
    );
    Ok(())
}

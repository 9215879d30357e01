//! # Container Image Build Benchmark Suite Library
//!
//! A benchmarking harness that compares two container-image build tools:
//! `tdfs`, a row/column-addressable layering builder, and `docker`, a
//! conventional layered image builder. The suite sweeps workload parameters
//! (file count, file size, change rate) and records wall-clock and
//! phase-level timings for later analysis.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `scan`: Tokenized, position-aware view over raw build-tool log text
//! - `timefmt`: Wall-clock and elapsed-duration token parsing
//! - `extract`: Tool-specific phase extractors producing timing metrics
//! - `fixtures`: Random test-file generation and workspace cleanup
//! - `manifest`: 2dfs manifest and Dockerfile emission
//! - `runner`: External build/export/cleanup process invocation
//! - `results`: Run record aggregation and CSV output management
//! - `sweep`: Experiment grid iteration and per-run orchestration
//! - `cli`: Command-line interface parsing and configuration management
//!
//! ## Measurement Model
//!
//! Both build tools emit free-form console output in their own ad-hoc
//! textual formats. The extraction engine reduces either format to a common
//! structured metric: total elapsed time, download/fetch time, and
//! layering/export time. Extraction is a pure function of the captured log
//! text; a failed invocation (empty output) yields all-zero metrics and the
//! run is still recorded, so an interrupted or partially failing sweep never
//! loses a data point.
//!
//! ## Usage Example
//!
//! ```rust
//! use build_benchmark::extract::{PhaseExtractor, TdfsExtractor};
//!
//! let log = "2024/05/01 12:00:01 Parsing manifest file\n\
//!            2024/05/01 12:00:03 Image index retrieved\n\
//!            1:30.50elapsed 95%CPU\n";
//! let metrics = TdfsExtractor.extract(log);
//! assert_eq!(metrics.total, 90.5);
//! assert_eq!(metrics.download, 2.0);
//! ```

/// Tokenized log scanning
///
/// Provides a pure, restartable view over captured log text: lines in
/// order, whitespace-split tokens with stable indices, and positional
/// lookups so a marker found at token `i` can reference neighbors at
/// `i - k` or `i + k` on the same line.
pub mod scan;

/// Timestamp and duration token parsing
///
/// Converts `HH:MM:SS` wall-clock tokens into comparable seconds-since-
/// midnight offsets and `MM:SS.ss`-shaped elapsed tokens (as printed by
/// `time(1)`) into seconds. Malformed tokens yield a typed `ParseError`
/// that callers recover from locally.
pub mod timefmt;

/// Tool-specific phase extraction
///
/// The core of the suite: one `PhaseExtractor` implementation per build
/// tool, each reducing that tool's log vocabulary to a common
/// `PhaseMetrics` triple. The two extractors are intentionally separate;
/// their marker-to-metric mappings are irreconcilable (single-timestamp
/// deltas for tdfs versus summed per-step durations for docker).
pub mod extract;

/// Test fixture generation
///
/// Creates workload input files filled with random bytes and removes them
/// between runs.
pub mod fixtures;

/// Build descriptor emission
///
/// Serializes a fixture file list into the 2dfs JSON manifest consumed by
/// `tdfs build` and into an equivalent Dockerfile for `docker build`.
pub mod manifest;

/// External process invocation
///
/// Runs build, export, and cleanup commands to completion and captures
/// their combined stdout/stderr. A failed invocation surfaces as empty
/// output rather than an error.
pub mod runner;

/// Result aggregation and CSV output
///
/// Combines extracted metrics with the sweep's configuration values into
/// flat run records and persists them. The output file is fully rewritten
/// after every run so an interrupted sweep leaves a valid partial table.
pub mod results;

/// Experiment sweep driver
///
/// Iterates workload configurations and repeat counts, with a cooldown
/// between runs, invoking fixture generation, descriptor emission, the
/// build tools, and metric extraction for each run.
pub mod sweep;

/// Command-line interface and configuration
pub mod cli;

pub mod logging;

// Re-export key types for convenient library usage

/// Phase extraction engine types
pub use extract::{DockerExtractor, ExportMetrics, PhaseExtractor, PhaseMetrics, TdfsExtractor};

/// Result collection and management
pub use results::{ResultsTable, RunRecord};

/// Sweep configuration and driver
pub use sweep::{SweepConfig, SweepRunner, WorkloadCase};

/// Command-line interface types
pub use cli::{Args, BuildTool, ExperimentMode};

/// The current version of the benchmark suite
///
/// Automatically populated from Cargo.toml and recorded in logs for
/// reproducibility.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// Sensible defaults for all configurable parameters, matching the
/// experiment setup used to produce the historical benchmark data.
pub mod defaults {
    use std::time::Duration;

    /// Default number of repeats per workload case
    pub const REPEAT: usize = 5;

    /// Default cooldown between runs
    ///
    /// Lets system caches and the build daemons settle between
    /// configurations. This is a scheduling policy, not a correctness
    /// requirement.
    pub const COOLDOWN: Duration = Duration::from_secs(10);

    /// Default output file name
    pub const OUTPUT_FILE: &str = "results.csv";

    /// Default directory for generated fixture files
    pub const WORK_DIR: &str = "files";

    /// Base image both builders start from
    pub const BASE_IMAGE: &str = "ubuntu:22.04";

    /// Tag applied to every benchmark build
    pub const IMAGE_TAG: &str = "test:v1";
}

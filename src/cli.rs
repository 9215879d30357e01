use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Build Benchmark Suite - compares container image build tools across
/// workload sweeps
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Experiment to run (build, cache, or export)
    #[clap(short = 'e', value_enum, default_value_t = ExperimentMode::Build)]
    pub experiment: ExperimentMode,

    /// Output file for results (CSV format)
    #[clap(short = 'o', long, default_value = crate::defaults::OUTPUT_FILE)]
    pub output_file: PathBuf,

    /// Directory for generated fixture files
    #[clap(long, default_value = crate::defaults::WORK_DIR)]
    pub work_dir: PathBuf,

    /// Number of repeats per workload case
    #[clap(short = 'r', long, default_value_t = crate::defaults::REPEAT)]
    pub repeat: usize,

    /// Cooldown between runs, in seconds
    #[clap(long, default_value_t = crate::defaults::COOLDOWN.as_secs())]
    pub cooldown: u64,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// The cooldown flag as a duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown)
    }
}

/// Experiment variants, each with its own workload grid and result columns
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum ExperimentMode {
    /// Cold build timing per tool
    #[clap(name = "build")]
    Build,

    /// Cold build, change a subset of inputs, then warm (cached) rebuild
    #[clap(name = "cache")]
    Cache,

    /// Cold build followed by a partitioned image export
    #[clap(name = "export")]
    Export,
}

impl std::fmt::Display for ExperimentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentMode::Build => write!(f, "build"),
            ExperimentMode::Cache => write!(f, "cache"),
            ExperimentMode::Export => write!(f, "export"),
        }
    }
}

/// The build tools under comparison
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum BuildTool {
    /// Row/column-addressable layering builder
    #[clap(name = "tdfs")]
    Tdfs,

    /// Conventional layered image builder
    #[clap(name = "docker")]
    Docker,
}

impl BuildTool {
    /// Tool identifier used in the results table
    pub fn name(&self) -> &'static str {
        match self {
            BuildTool::Tdfs => "tdfs",
            BuildTool::Docker => "docker",
        }
    }
}

impl std::fmt::Display for BuildTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

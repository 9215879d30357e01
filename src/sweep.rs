//! # Experiment Sweep Driver
//!
//! Iterates the workload grid of the selected experiment and runs both
//! tools once per repeat: generate fixtures, emit the build descriptors,
//! invoke the tool, hand the captured output to the matching phase
//! extractor, and append the resulting record to the results table.
//!
//! Execution is fully sequential. Each run completes (fixtures, build,
//! parse, cleanup) before the next begins, and a cooldown sleep before
//! every run lets system caches and the build daemons settle. The results
//! table is the only state that crosses iterations.

use crate::cli::{Args, BuildTool, ExperimentMode};
use crate::extract::{extractor_for, PhaseExtractor, TdfsExtractor};
use crate::results::{ResultsTable, RunRecord};
use crate::runner::{CommandRunner, Partition, ToolInvoker};
use crate::timefmt::format_elapsed;
use crate::{fixtures, manifest};
use anyhow::{ensure, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// One cell of the workload grid.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadCase {
    /// Number of files placed into the build
    pub allotments: usize,
    /// Size of each file in MiB
    pub size_mib: usize,
    /// Files regenerated before the warm build (cache experiment only)
    pub change: usize,
}

/// Explicit sweep configuration.
///
/// The workload grids themselves are fixed in-process lists chosen to
/// match the recorded experiments; everything around them (repeats,
/// cooldown, paths) is injected so sweeps stay repeatable.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub mode: ExperimentMode,
    pub cases: Vec<WorkloadCase>,
    pub repeat: usize,
    pub cooldown: Duration,
    /// Directory the fixture files are generated in
    pub work_dir: PathBuf,
    /// Directory the build descriptors are written to, and the docker
    /// build context
    pub descriptor_dir: PathBuf,
    pub output_file: PathBuf,
}

impl SweepConfig {
    /// Configuration for `args.experiment` with that experiment's grid.
    pub fn from_args(args: &Args) -> Self {
        Self {
            mode: args.experiment,
            cases: Self::grid(args.experiment),
            repeat: args.repeat,
            cooldown: args.cooldown(),
            work_dir: args.work_dir.clone(),
            descriptor_dir: PathBuf::from("."),
            output_file: args.output_file.clone(),
        }
    }

    /// The fixed workload grid of an experiment.
    ///
    /// Grid contents and order match the recorded benchmark campaigns;
    /// repeated cache cases are deliberate (they probe run-to-run variance
    /// of the same configuration).
    pub fn grid(mode: ExperimentMode) -> Vec<WorkloadCase> {
        let case = |size_mib, allotments, change| WorkloadCase {
            allotments,
            size_mib,
            change,
        };
        match mode {
            ExperimentMode::Build => vec![
                case(100, 10, 0),
                case(1000, 1, 0),
                case(500, 5, 0),
            ],
            ExperimentMode::Cache => vec![
                case(500, 2, 1),
                case(10, 100, 1),
                case(10, 100, 1),
                case(5, 200, 1),
                case(10, 100, 1),
                case(10, 100, 10),
                case(10, 100, 50),
            ],
            ExperimentMode::Export => vec![
                case(1000, 1, 0),
                case(500, 2, 0),
                case(100, 10, 0),
                case(10, 100, 0),
                case(200, 5, 0),
            ],
        }
    }

    /// Reject malformed grids before any run happens.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.repeat > 0, "repeat count must be positive");
        ensure!(!self.cases.is_empty(), "workload grid is empty");
        for case in &self.cases {
            ensure!(case.allotments > 0, "allotment count must be positive");
            ensure!(case.size_mib > 0, "fixture size must be positive");
            if self.mode == ExperimentMode::Cache {
                ensure!(
                    case.change >= 1 && case.change <= case.allotments,
                    "change count {} out of range for {} allotments",
                    case.change,
                    case.allotments
                );
            }
        }
        Ok(())
    }
}

/// Drives a full sweep to completion.
///
/// Generic over the [`ToolInvoker`] so tests can substitute a canned
/// invoker; production code uses [`SweepRunner::new`] and gets the real
/// [`CommandRunner`].
pub struct SweepRunner<R: ToolInvoker = CommandRunner> {
    config: SweepConfig,
    runner: R,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> Self {
        Self::with_invoker(config, CommandRunner::new())
    }
}

impl<R: ToolInvoker> SweepRunner<R> {
    pub fn with_invoker(config: SweepConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Run every case of the grid `repeat` times, recording one row per
    /// tool per run. Only resource-level failures (fixture or table
    /// writes) abort the sweep; failed builds record all-zero rows.
    pub async fn run(&self) -> Result<ResultsTable> {
        self.config.validate()?;
        let mut table = ResultsTable::new(&self.config.output_file, self.config.mode);

        // start from no cached image state
        self.runner.cleanup_tdfs().await;
        self.runner.cleanup_docker().await;

        for case in &self.config.cases {
            info!(
                "experiment config: allotments={} size={}MiB change={}",
                case.allotments, case.size_mib, case.change
            );
            for rep in 0..self.config.repeat {
                info!("cooldown before run {}", rep);
                tokio::time::sleep(self.config.cooldown).await;
                self.run_case(case, &mut table).await?;
            }
        }
        Ok(table)
    }

    async fn run_case(&self, case: &WorkloadCase, table: &mut ResultsTable) -> Result<()> {
        let files =
            fixtures::populate(&self.config.work_dir, case.allotments, case.size_mib)?;

        self.run_tdfs(case, &files, table).await?;
        self.run_docker(case, &files, table).await?;

        fixtures::cleanup(&self.config.work_dir)
    }

    async fn run_tdfs(
        &self,
        case: &WorkloadCase,
        files: &[PathBuf],
        table: &mut ResultsTable,
    ) -> Result<()> {
        let manifest_path = self.config.descriptor_dir.join("2dfs.json");
        manifest::TdfsManifest::from_files(files).write(&manifest_path)?;

        let cold = TdfsExtractor.extract(&self.runner.build_tdfs().await);
        info!(
            "tdfs cold build: total={} download={} layering={}",
            format_elapsed(cold.total),
            format_elapsed(cold.download),
            format_elapsed(cold.layering)
        );

        let record = match self.config.mode {
            ExperimentMode::Build => RunRecord::from_build(BuildTool::Tdfs, case, cold),
            ExperimentMode::Cache => {
                fixtures::refresh(&self.config.work_dir, case.change, case.size_mib)?;
                let warm = TdfsExtractor.extract(&self.runner.build_tdfs().await);
                info!("tdfs warm build: total={}", format_elapsed(warm.total));
                RunRecord::from_cache(BuildTool::Tdfs, case, warm)
            }
            ExperimentMode::Export => {
                let partition = Partition::full(case.allotments);
                let export =
                    TdfsExtractor.extract_export(&self.runner.export_tdfs(partition).await);
                info!(
                    "tdfs export: total={} partitioning={}",
                    format_elapsed(export.total),
                    format_elapsed(export.partitioning)
                );
                RunRecord::from_export(BuildTool::Tdfs, case, export)
            }
        };
        table.append(record)?;

        self.runner.cleanup_tdfs().await;
        Ok(())
    }

    async fn run_docker(
        &self,
        case: &WorkloadCase,
        files: &[PathBuf],
        table: &mut ResultsTable,
    ) -> Result<()> {
        let dockerfile = self.config.descriptor_dir.join("Dockerfile");
        manifest::write_dockerfile(files, &dockerfile)?;
        let extractor = extractor_for(BuildTool::Docker);
        let context = &self.config.descriptor_dir;

        let cold = extractor.extract(&self.runner.build_docker(context).await);
        info!(
            "docker cold build: total={} download={} layering={}",
            format_elapsed(cold.total),
            format_elapsed(cold.download),
            format_elapsed(cold.layering)
        );

        let record = match self.config.mode {
            ExperimentMode::Build => RunRecord::from_build(BuildTool::Docker, case, cold),
            ExperimentMode::Cache => {
                fixtures::refresh(&self.config.work_dir, case.change, case.size_mib)?;
                let warm = extractor.extract(&self.runner.build_docker(context).await);
                info!("docker warm build: total={}", format_elapsed(warm.total));
                RunRecord::from_cache(BuildTool::Docker, case, warm)
            }
            ExperimentMode::Export => {
                // docker has no partitioned export; record the tar export
                // total with a zero partitioning column for comparability
                let save = extractor.extract(&self.runner.export_docker().await);
                info!("docker export: total={}", format_elapsed(save.total));
                RunRecord::from_export(
                    BuildTool::Docker,
                    case,
                    crate::extract::ExportMetrics {
                        total: save.total,
                        partitioning: 0.0,
                    },
                )
            }
        };
        table.append(record)?;

        self.runner.cleanup_docker().await;
        Ok(())
    }
}

//! Sweep driver tests exercising the full per-run pipeline (fixtures,
//! descriptors, invocation, extraction, CSV output) through stub tool
//! invokers, so no real build daemon, image store, or network is touched.
//! One stub models absent/failing tools (empty log text, which must still
//! record a row for every run); the other replays captured console output
//! so measured timings flow end to end into the table.

use async_trait::async_trait;
use build_benchmark::cli::ExperimentMode;
use build_benchmark::runner::{Partition, ToolInvoker};
use build_benchmark::sweep::{SweepConfig, SweepRunner, WorkloadCase};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Tools missing from `PATH`: every invocation yields empty output.
struct AbsentTools;

#[async_trait]
impl ToolInvoker for AbsentTools {
    async fn build_tdfs(&self) -> String {
        String::new()
    }
    async fn build_docker(&self, _context: &Path) -> String {
        String::new()
    }
    async fn export_tdfs(&self, _partition: Partition) -> String {
        String::new()
    }
    async fn export_docker(&self) -> String {
        String::new()
    }
    async fn cleanup_tdfs(&self) {}
    async fn cleanup_docker(&self) {}
}

/// Replays captured console output for both tools.
struct RecordedTools;

const TDFS_LOG: &str = "\
2024/05/01 14:10:02 Parsing manifest file
2024/05/01 14:10:04 Image index retrieved
2024/05/01 14:10:09 File f0 [COPY]
0:13.45elapsed
";

const DOCKER_LOG: &str = "\
#2 [internal] load metadata DONE 0.4s
#5 [1/2] FROM docker.io/library/ubuntu:22.04 DONE 0.0s
#6 [2/2] COPY files /files DONE 1.5s
#7 exporting to image
#7 DONE 0.2s
0:08.31elapsed
";

#[async_trait]
impl ToolInvoker for RecordedTools {
    async fn build_tdfs(&self) -> String {
        TDFS_LOG.to_string()
    }
    async fn build_docker(&self, _context: &Path) -> String {
        DOCKER_LOG.to_string()
    }
    async fn export_tdfs(&self, _partition: Partition) -> String {
        String::new()
    }
    async fn export_docker(&self) -> String {
        String::new()
    }
    async fn cleanup_tdfs(&self) {}
    async fn cleanup_docker(&self) {}
}

fn tiny_config(dir: &TempDir, mode: ExperimentMode) -> SweepConfig {
    SweepConfig {
        mode,
        cases: vec![WorkloadCase {
            allotments: 2,
            size_mib: 1,
            change: 1,
        }],
        repeat: 1,
        cooldown: Duration::ZERO,
        work_dir: dir.path().join("files"),
        descriptor_dir: dir.path().to_path_buf(),
        output_file: dir.path().join("results.csv"),
    }
}

#[tokio::test]
async fn build_sweep_records_a_row_per_tool_per_run() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Build);
    let table = SweepRunner::with_invoker(config.clone(), AbsentTools)
        .run()
        .await
        .unwrap();

    assert_eq!(table.len(), 2);

    let written = std::fs::read_to_string(&config.output_file).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "tool,allotments,size,tot,download,layering");
    assert!(lines[1].starts_with("tdfs,2,1,"));
    assert!(lines[2].starts_with("docker,2,1,"));
}

#[tokio::test]
async fn build_sweep_extracts_timings_from_tool_output() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Build);
    SweepRunner::with_invoker(config.clone(), RecordedTools)
        .run()
        .await
        .unwrap();

    let written = std::fs::read_to_string(&config.output_file).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    // tdfs: 13.45 total, retrieved at +2s, copy at +7s minus download
    assert_eq!(lines[1], "tdfs,2,1,13.45,2,5");
    // docker: 8.31 total, 0.4s flushed at the #5 stage, 1.5s at the
    // export boundary; the trailing 0.2s is never flushed
    assert_eq!(lines[2], "docker,2,1,8.31,0.4,1.5");
}

#[tokio::test]
async fn sweep_emits_both_build_descriptors() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Build);
    SweepRunner::with_invoker(config, AbsentTools).run().await.unwrap();

    let manifest = std::fs::read_to_string(dir.path().join("2dfs.json")).unwrap();
    assert!(manifest.contains("\"allotments\""));
    assert!(manifest.contains("\"dst\":\"/file1\""));

    let dockerfile = std::fs::read_to_string(dir.path().join("Dockerfile")).unwrap();
    assert!(dockerfile.starts_with("FROM ubuntu:22.04\n"));
    assert_eq!(dockerfile.matches("COPY ").count(), 2);
}

#[tokio::test]
async fn sweep_cleans_the_fixture_dir_between_runs() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Build);
    let work_dir = config.work_dir.clone();
    SweepRunner::with_invoker(config, AbsentTools).run().await.unwrap();

    assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn cache_sweep_records_the_change_column() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Cache);
    let table = SweepRunner::with_invoker(config.clone(), AbsentTools)
        .run()
        .await
        .unwrap();

    assert_eq!(table.len(), 2);
    let written = std::fs::read_to_string(&config.output_file).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "tool,allotments,size,changed,tot,download,layering");
    assert!(lines[1].starts_with("tdfs,2,1,1,"));
}

#[tokio::test]
async fn export_sweep_uses_the_partitioning_header() {
    let dir = TempDir::new().unwrap();
    let config = tiny_config(&dir, ExperimentMode::Export);
    SweepRunner::with_invoker(config.clone(), AbsentTools)
        .run()
        .await
        .unwrap();

    let written = std::fs::read_to_string(&config.output_file).unwrap();
    assert!(written.starts_with("tool,allotments,size,tot,partitioning\n"));
}

#[tokio::test]
async fn invalid_grid_aborts_before_any_run() {
    let dir = TempDir::new().unwrap();
    let mut config = tiny_config(&dir, ExperimentMode::Build);
    config.cases[0].allotments = 0;

    assert!(SweepRunner::with_invoker(config.clone(), AbsentTools)
        .run()
        .await
        .is_err());
    assert!(!config.output_file.exists(), "no table written for a rejected grid");
}

//! # Result Aggregation and CSV Output
//!
//! Combines per-run extracted metrics with the sweep's configuration values
//! into flat [`RunRecord`]s and persists them as a CSV table. The header is
//! fixed per experiment mode and rows are appended in run order.
//!
//! The whole file is truncated and rewritten after every appended row, so
//! an interrupted sweep always leaves a valid partial table on disk. Sweeps
//! take hours; losing every completed run to a crash near the end is the
//! failure mode this guards against.

use crate::cli::{BuildTool, ExperimentMode};
use crate::extract::{ExportMetrics, PhaseMetrics};
use crate::sweep::WorkloadCase;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One row of the results table.
///
/// For export runs the `layering` field carries the partitioning time and
/// the `download` field is unused.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub tool: BuildTool,
    pub allotments: usize,
    pub size_mib: usize,
    pub changed: Option<usize>,
    pub total: f64,
    pub download: f64,
    pub layering: f64,
}

impl RunRecord {
    /// Record for a cold-build run.
    pub fn from_build(tool: BuildTool, case: &WorkloadCase, metrics: PhaseMetrics) -> Self {
        Self {
            tool,
            allotments: case.allotments,
            size_mib: case.size_mib,
            changed: None,
            total: metrics.total,
            download: metrics.download,
            layering: metrics.layering,
        }
    }

    /// Record for a warm-rebuild run after changing `case.change` inputs.
    pub fn from_cache(tool: BuildTool, case: &WorkloadCase, metrics: PhaseMetrics) -> Self {
        Self {
            changed: Some(case.change),
            ..Self::from_build(tool, case, metrics)
        }
    }

    /// Record for a partitioned-export run.
    pub fn from_export(tool: BuildTool, case: &WorkloadCase, metrics: ExportMetrics) -> Self {
        Self {
            tool,
            allotments: case.allotments,
            size_mib: case.size_mib,
            changed: None,
            total: metrics.total,
            download: 0.0,
            layering: metrics.partitioning,
        }
    }
}

/// Append-only results table with rewrite-on-append persistence.
pub struct ResultsTable {
    path: PathBuf,
    mode: ExperimentMode,
    records: Vec<RunRecord>,
}

impl ResultsTable {
    pub fn new(path: &Path, mode: ExperimentMode) -> Self {
        Self {
            path: path.to_path_buf(),
            mode,
            records: Vec::new(),
        }
    }

    /// Header row for this table's experiment mode.
    ///
    /// Column names match the historical result files and must not change.
    pub fn header(&self) -> &'static str {
        match self.mode {
            ExperimentMode::Build => "tool,allotments,size,tot,download,layering",
            ExperimentMode::Cache => "tool,allotments,size,changed,tot,download,layering",
            ExperimentMode::Export => "tool,allotments,size,tot,partitioning",
        }
    }

    /// Append a record and rewrite the output file.
    pub fn append(&mut self, record: RunRecord) -> Result<()> {
        debug!(
            "recording {} run: allotments={} size={}MiB",
            record.tool, record.allotments, record.size_mib
        );
        self.records.push(record);
        self.rewrite()
    }

    /// Number of recorded runs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn format_row(&self, record: &RunRecord) -> String {
        let mut row = format!(
            "{},{},{}",
            record.tool.name(),
            record.allotments,
            record.size_mib
        );
        if self.mode == ExperimentMode::Cache {
            let _ = write!(row, ",{}", record.changed.unwrap_or(0));
        }
        let _ = write!(row, ",{}", record.total);
        match self.mode {
            ExperimentMode::Export => {
                let _ = write!(row, ",{}", record.layering);
            }
            _ => {
                let _ = write!(row, ",{},{}", record.download, record.layering);
            }
        }
        row
    }

    /// Truncate and rewrite the whole table.
    fn rewrite(&self) -> Result<()> {
        let mut contents = String::from(self.header());
        contents.push('\n');
        for record in &self.records {
            contents.push_str(&self.format_row(record));
            contents.push('\n');
        }
        std::fs::write(&self.path, contents)
            .with_context(|| format!("failed to write results table {:?}", self.path))
    }
}

//! # External Process Invocation
//!
//! Runs the build, export, and cleanup commands of both tools to
//! completion and captures their combined stdout/stderr for the phase
//! extractors. Build commands are wrapped in `time(1)`, whose
//! `elapsed`-suffixed field is the total-time source for both tools.
//!
//! The contract with the extractors is deliberately thin: one opaque text
//! blob per invocation, and the empty string when the command could not be
//! launched or exited non-zero. The extractors map empty text to all-zero
//! metrics, so a failed build still produces a result row.
//!
//! The sweep driver reaches the tools only through the [`ToolInvoker`]
//! trait. [`CommandRunner`] is the real implementation; tests substitute
//! stubs so `cargo test` never touches a live Docker daemon or image
//! store.

use crate::defaults::{BASE_IMAGE, IMAGE_TAG};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// File the image exports are written to.
const EXPORT_TARGET: &str = "export.tar";

/// A rectangular slice of the 2dfs allotment grid, addressed by its
/// corner coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Partition {
    pub row0: usize,
    pub col0: usize,
    pub row1: usize,
    pub col1: usize,
}

impl Partition {
    /// The partition covering every allotment of an `n`-file manifest.
    pub fn full(n: usize) -> Self {
        Self {
            row0: 0,
            col0: 0,
            row1: n,
            col1: n,
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}.{}", self.row0, self.col0, self.row1, self.col1)
    }
}

/// The tools under test, as the sweep driver sees them.
///
/// Build and export methods return one invocation's combined console
/// output, or the empty string on failure. Cleanup methods best-effort
/// drop the tool's cached state between runs and never fail.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Build the current manifest with the layering tool.
    async fn build_tdfs(&self) -> String;

    /// Build the Dockerfile in `context` with the conventional builder.
    async fn build_docker(&self, context: &Path) -> String;

    /// Export a partition of the built tdfs image to a tarball.
    async fn export_tdfs(&self, partition: Partition) -> String;

    /// Export the built docker image to a tarball. Docker has no partition
    /// concept; this is the closest analogue to the tdfs export.
    async fn export_docker(&self) -> String;

    /// Drop all tdfs image state between runs.
    async fn cleanup_tdfs(&self);

    /// Drop all docker build and cache state between runs.
    async fn cleanup_docker(&self);
}

/// Invokes the real tools on `PATH` and captures their output.
#[derive(Debug, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion and return its combined stdout+stderr.
    ///
    /// A spawn failure or non-zero exit yields the empty string; the
    /// process runner decides nothing about retries or timeouts.
    pub async fn run_captured(&self, program: &str, args: &[&str]) -> String {
        debug!("running: {} {}", program, args.join(" "));
        match Command::new(program).args(args).output().await {
            Ok(output) if output.status.success() => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                text
            }
            Ok(output) => {
                warn!("{} exited with {}", program, output.status);
                String::new()
            }
            Err(e) => {
                warn!("failed to launch {}: {}", program, e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl ToolInvoker for CommandRunner {
    async fn build_tdfs(&self) -> String {
        self.run_captured(
            "time",
            &[
                "tdfs",
                "build",
                BASE_IMAGE,
                IMAGE_TAG,
                "--platforms",
                "linux/amd64",
            ],
        )
        .await
    }

    async fn build_docker(&self, context: &Path) -> String {
        let context = context.to_string_lossy();
        self.run_captured("time", &["docker", "build", "-t", IMAGE_TAG, &context])
            .await
    }

    async fn export_tdfs(&self, partition: Partition) -> String {
        let reference = format!("{IMAGE_TAG}--{partition}");
        self.run_captured(
            "time",
            &["tdfs", "image", "export", &reference, EXPORT_TARGET, "--as", "tar"],
        )
        .await
    }

    async fn export_docker(&self) -> String {
        self.run_captured("time", &["docker", "save", "-o", EXPORT_TARGET, IMAGE_TAG])
            .await
    }

    /// Failures are ignored; a missing image is the desired end state
    /// anyway.
    async fn cleanup_tdfs(&self) {
        let _ = self.run_captured("tdfs", &["image", "rm", "-a"]).await;
        remove_artifact(Path::new(EXPORT_TARGET)).await;
    }

    async fn cleanup_docker(&self) {
        let _ = self
            .run_captured("docker", &["system", "prune", "-a", "-f"])
            .await;
        // docker save writes the same tarball the tdfs export does
        remove_artifact(Path::new(EXPORT_TARGET)).await;
    }
}

/// Remove a leftover export artifact, tolerating its absence.
async fn remove_artifact(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove {:?}: {}", path, e);
        }
    }
}

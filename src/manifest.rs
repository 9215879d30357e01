//! # Build Descriptor Emission
//!
//! Turns a fixture file list into the descriptor each tool consumes: the
//! 2dfs JSON manifest for `tdfs build` and a plain Dockerfile for
//! `docker build`. Allotment `i` lands at destination `/file<i>` and
//! placement coordinate `(i, i)`, giving every file its own row and column
//! so the layering tool materializes one layer per allotment.

use crate::defaults::BASE_IMAGE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One file entry placed into the 2dfs manifest at a specific coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allotment {
    pub src: String,
    pub dst: String,
    pub row: usize,
    pub col: usize,
}

/// The build descriptor consumed by `tdfs build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdfsManifest {
    pub allotments: Vec<Allotment>,
}

impl TdfsManifest {
    /// Build a manifest mapping each source file to `/file<i>` at `(i, i)`.
    pub fn from_files<P: AsRef<Path>>(files: &[P]) -> Self {
        let allotments = files
            .iter()
            .enumerate()
            .map(|(i, f)| Allotment {
                src: f.as_ref().to_string_lossy().into_owned(),
                dst: format!("/file{i}"),
                row: i,
                col: i,
            })
            .collect();
        Self { allotments }
    }

    /// Serialize to `path`, replacing any previous manifest.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write manifest {:?}", path))
    }
}

/// Emit an equivalent Dockerfile: the shared base image plus one `COPY`
/// line per file, so both tools perform the same logical work.
pub fn write_dockerfile<P: AsRef<Path>>(files: &[P], path: &Path) -> Result<()> {
    let mut contents = format!("FROM {BASE_IMAGE}\n");
    for (i, f) in files.iter().enumerate() {
        contents.push_str(&format!("COPY {} /file{}\n", f.as_ref().display(), i));
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write Dockerfile {:?}", path))
}

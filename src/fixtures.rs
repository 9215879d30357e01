//! # Test Fixture Generation
//!
//! Produces the workload input files both builders consume: N files of a
//! requested size filled with non-deterministic bytes, so no two runs can
//! hit content-addressed caches by accident. Files are written in 1 MiB
//! chunks to keep memory flat regardless of the requested size.

use anyhow::{ensure, Context, Result};
use rand::RngCore;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const CHUNK_BYTES: usize = 1024 * 1024;

/// Create a file of `size_mib` mebibytes of random bytes at `path`.
pub fn create_random_file(path: &Path, size_mib: usize) -> Result<()> {
    ensure!(size_mib > 0, "fixture size must be positive");

    let mut file =
        File::create(path).with_context(|| format!("failed to create fixture {:?}", path))?;
    let mut rng = rand::thread_rng();
    let mut chunk = vec![0u8; CHUNK_BYTES];

    for _ in 0..size_mib {
        rng.fill_bytes(&mut chunk);
        file.write_all(&chunk)?;
    }
    file.flush()?;
    Ok(())
}

/// Fixture file path for allotment `index` inside `dir`.
pub fn fixture_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("f{index}"))
}

/// Populate `dir` with `count` fresh random files of `size_mib` MiB each,
/// returning their paths in allotment order.
pub fn populate(dir: &Path, count: usize, size_mib: usize) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create fixture dir {:?}", dir))?;

    let mut files = Vec::with_capacity(count);
    for i in 0..count {
        let path = fixture_path(dir, i);
        create_random_file(&path, size_mib)?;
        files.push(path);
    }
    debug!("populated {} fixture files of {}MiB in {:?}", count, size_mib, dir);
    Ok(files)
}

/// Regenerate the first `count` fixture files in place, changing their
/// content for a warm-build run.
pub fn refresh(dir: &Path, count: usize, size_mib: usize) -> Result<()> {
    for i in 0..count {
        let path = fixture_path(dir, i);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        create_random_file(&path, size_mib)?;
    }
    Ok(())
}

/// Remove every file in `dir`. Subdirectories are left alone.
pub fn cleanup(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

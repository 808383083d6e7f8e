//! # tplfetch Filesystem Operations (`common::fs::io`)
//!
//! File: cli/src/common/fs/io.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` used when placing fetched templates on disk:
//!
//! - **`ensure_dir_exists`**: creates a directory (and parents) or confirms an
//!   existing path is a directory.
//! - **`dir_is_empty`**: reports whether a directory has no entries.
//! - **`move_dir_contents`**: moves every child of one directory into another,
//!   replacing same-named children. Used to commit a staged extraction into the
//!   destination. Both directories must be on the same filesystem.
//!
//! Errors carry context naming the path involved.
//!
use crate::core::error::{FetchError, Result};
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path.
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or if creating
/// it fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(FetchError::Config(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Returns true if `path` is a directory with no entries.
pub fn dir_is_empty(path: &Path) -> Result<bool> {
    let mut entries =
        fs::read_dir(path).with_context(|| format!("Failed to read directory {:?}", path))?;
    Ok(entries.next().is_none())
}

/// Moves every entry of `source` into `target`, replacing existing entries of
/// the same name. `target` is created if missing.
pub fn move_dir_contents(source: &Path, target: &Path) -> Result<()> {
    ensure_dir_exists(target)?;
    for entry in
        fs::read_dir(source).with_context(|| format!("Failed to read directory {:?}", source))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in {:?}", source))?;
        let destination = target.join(entry.file_name());
        if let Ok(meta) = fs::symlink_metadata(&destination) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&destination)
            } else {
                fs::remove_file(&destination)
            };
            removed.with_context(|| format!("Failed to replace {:?}", destination))?;
        }
        fs::rename(entry.path(), &destination).with_context(|| {
            format!("Failed to move {:?} to {:?}", entry.path(), destination)
        })?;
    }
    debug!("Moved contents of {:?} into {:?}", source, target);
    Ok(())
}

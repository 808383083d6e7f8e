//! # tplfetch TAR Archive Creation (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Builds gzipped tarballs (`.tar.gz`) from a directory tree. The git fallback
//! uses this to turn a shallow clone into an archive shaped exactly like the
//! tarballs GitHub and GitLab serve: every entry lives under a single
//! `<prefix>/` top-level directory, and the `.git` metadata is left out.
//!
//! ## Architecture
//!
//! The `tar` crate builds the archive structure and `flate2` gzips it, writing
//! straight to a file so large templates never sit fully in memory. Entries are
//! visited with `walkdir` in file-name order, giving byte-stable archives for a
//! given tree.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::tar;
//! # fn main() -> crate::core::error::Result<()> {
//! let cancel = AtomicBool::new(false);
//! let written = tar::create_prefixed_tarball_cancellable(
//!     Path::new("/tmp/ws/repo"),
//!     "solidjs-templates-abc1234",
//!     Path::new("/tmp/ws/solidjs-templates-abc1234.tar.gz"),
//!     &cancel,
//! )?;
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::Result; // Use the standard Result type from the core module
use anyhow::{bail, Context}; // For adding contextual information to errors
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

/// Directory names never copied into an archive.
const EXCLUDED_DIRS: &[&str] = &[".git"];

/// Archives without a cancel flag.
#[cfg(test)]
pub fn create_prefixed_tarball(source_dir: &Path, prefix: &str, output: &Path) -> Result<usize> {
    create_prefixed_tarball_cancellable(source_dir, prefix, output, &AtomicBool::new(false))
}

/// # Create Prefixed Gzipped TAR (`create_prefixed_tarball_cancellable`)
///
/// Archives the contents of `source_dir` into `output`, placing every entry
/// under `prefix/`. Stops before the next entry once `cancel` is set.
///
/// ## Arguments
///
/// * `source_dir` - Directory to archive. Must exist.
/// * `prefix` - Top-level directory name inside the archive (no slashes).
/// * `output` - Path of the `.tar.gz` file to create (overwritten if present).
/// * `cancel` - Checked before each entry.
///
/// ## Returns
///
/// * `Result<usize>` - Number of entries written, including the prefix directory.
///
/// ## Errors
///
/// Returns an `Err` if the tree cannot be walked or read, the output file cannot
/// be written, finishing the tar/gzip streams fails, or `cancel` was set. A
/// failed call may leave a partial file at `output`; callers own its cleanup.
pub fn create_prefixed_tarball_cancellable(
    source_dir: &Path,
    prefix: &str,
    output: &Path,
    cancel: &AtomicBool,
) -> Result<usize> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create archive file '{}'", output.display()))?;
    let enc = flate2::write::GzEncoder::new(BufWriter::new(file), flate2::Compression::default());
    let mut builder = tar::Builder::new(enc);
    // Keep symlinks as symlinks, the way the hosting providers' tarballs do.
    builder.follow_symlinks(false);

    let prefix_path = PathBuf::from(prefix);
    builder
        .append_dir(&prefix_path, source_dir)
        .with_context(|| format!("Failed to add '{}' to the archive", prefix))?;
    let mut count = 1;

    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.depth() == 1
                && entry.file_type().is_dir()
                && EXCLUDED_DIRS.iter().any(|d| entry.file_name() == *d))
        });

    for entry in walker {
        if cancel.load(Ordering::Relaxed) {
            bail!("Archiving '{}' was canceled", source_dir.display());
        }
        let entry = entry.with_context(|| {
            format!("Failed to walk directory '{}'", source_dir.display())
        })?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("Walked entry is outside the source directory")?;
        let name = prefix_path.join(relative);

        let appended = if entry.file_type().is_dir() {
            builder.append_dir(&name, entry.path())
        } else {
            builder.append_path_with_name(entry.path(), &name)
        };
        appended.with_context(|| {
            format!("Failed to add '{}' to the archive", entry.path().display())
        })?;
        count += 1;
    }

    let encoder = builder
        .into_inner()
        .context("Failed to finalize tar archive structure")?;
    encoder
        .finish()
        .context("Failed to finish gzip compression stream")?
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush archive file")?
        .sync_all()
        .context("Failed to sync archive file")?;

    Ok(count)
}

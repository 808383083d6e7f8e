//! # Tarball Extraction (`fetch::extract`)
//!
//! File: cli/src/fetch/extract.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Materializes a `TarballStream` into a destination directory.
//!
//! ## Architecture
//!
//! Extraction is staged so the destination is only touched once the archive is
//! known to be complete and valid:
//!
//! 1. A staging directory is created next to the destination (same filesystem).
//! 2. The stream is spooled into `staging/download.tar.gz`. A stream error
//!    aborts here.
//! 3. On a blocking worker the archive is unpacked into `staging/tree`,
//!    stripping the top-level directory and narrowing to `subdir` if requested.
//! 4. The staged tree is moved into the destination.
//!
//! The staging directory is removed on every path (it is a `TempDir`). A
//! failure at any step leaves the destination as it was, so the strategy can
//! hand the same destination to the next fetch tier.
//!
use super::tarball::TarballStream;
use crate::common::archive::extract::unpack_tarball;
use crate::common::fs::io::{ensure_dir_exists, move_dir_contents};
use crate::core::error::{FetchError, FetchResult};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const STAGING_PREFIX: &str = ".tplfetch-staging-";

/// Writes the contents of `body` into `destination`.
///
/// `repo` is only used to name the repository in `SubdirNotFound` errors.
pub async fn extract_tarball(
    mut body: TarballStream,
    destination: &Path,
    subdir: Option<&str>,
    repo: &str,
) -> FetchResult<()> {
    let extraction_err = |message: String| FetchError::Extraction {
        path: destination.to_path_buf(),
        message,
    };

    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    ensure_dir_exists(&parent).map_err(|e| extraction_err(format!("{:#}", e)))?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)?;
    debug!("Staging extraction in {}", staging.path().display());

    let archive_path = staging.path().join("download.tar.gz");
    let mut file = tokio::fs::File::create(&archive_path).await?;
    let mut received: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| extraction_err(format!("download interrupted: {}", e)))?;
        received += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);
    debug!("Received {} bytes", received);

    let tree = staging.path().join("tree");
    let target = destination.to_path_buf();
    let subdir_owned = subdir.map(str::to_string);
    let summary = tokio::task::spawn_blocking(move || {
        let summary = unpack_tarball(&archive_path, &tree, subdir_owned.as_deref())?;
        if summary.matched {
            move_dir_contents(&tree, &target)?;
        }
        Ok::<_, anyhow::Error>(summary)
    })
    .await
    .map_err(|e| extraction_err(format!("extraction task failed: {}", e)))?
    .map_err(|e| extraction_err(format!("{:#}", e)))?;

    if !summary.matched {
        if let Some(sub) = subdir {
            return Err(FetchError::SubdirNotFound {
                repo: repo.to_string(),
                subdir: sub.to_string(),
            });
        }
        // An archive with nothing but the top-level directory: still create the destination.
        ensure_dir_exists(destination).map_err(|e| extraction_err(format!("{:#}", e)))?;
    }

    info!(
        "Extracted {} entries into {}",
        summary.entries,
        destination.display()
    );
    Ok(())
}

//! # Ephemeral Workspaces (`fetch::workspace`)
//!
//! File: cli/src/fetch/workspace.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! An `EphemeralWorkspace` is a uniquely named temporary directory owned by a
//! single git fallback fetch. It holds the shallow clone and the archive built
//! from it. Names come from `tempfile`, so concurrent fetches never share a path.
//!
//! Removal happens through `release()`, which runs at most once. Releasing a
//! workspace whose directory has already vanished is a no-op. Dropping an
//! unreleased workspace releases it.
//!
use crate::core::error::FetchResult;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "tplfetch-";

#[derive(Debug)]
pub struct EphemeralWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl EphemeralWorkspace {
    /// Creates a workspace under the system temp directory.
    pub fn create() -> FetchResult<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Creates a workspace under `parent`.
    pub fn create_in(parent: &Path) -> FetchResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)?;
        let path = dir.path().to_path_buf();
        debug!("Created ephemeral workspace {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }

    /// Deletes the workspace directory and everything in it.
    pub fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!("Removed ephemeral workspace {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Workspace {} was already gone", self.path.display())
            }
            Err(e) => warn!(
                "Failed to remove workspace {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

impl Drop for EphemeralWorkspace {
    fn drop(&mut self) {
        self.release();
    }
}

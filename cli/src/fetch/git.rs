//! # Git Archive Fallback (`fetch::git`)
//!
//! File: cli/src/fetch/git.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `GitArchiveFetcher` obtains a repository without any provider API: it
//! shallow-clones the repository with the local `git` executable and packs the
//! clone into a tarball shaped like the providers' own downloads. It exists for
//! environments where the tarball API is unreachable or unsupported (some
//! self-hosted instances, restrictive proxies, `file://` mirrors).
//!
//! ## Fetch Sequence
//!
//! ```text
//! Created -> Cloning -> HashResolving -> Archiving -> Streaming -> Completed | Canceled | Errored
//! ```
//!
//! 1. Create an `EphemeralWorkspace`.
//! 2. `git clone --depth 1 [--branch <b>] <base>/<owner>/<name>.git <ws>/repo`
//! 3. `git rev-parse HEAD`, shortened to 7 characters. Failure degrades to the
//!    literal `HEAD` (naming only).
//! 4. Archive `<ws>/repo` (minus `.git`) under `<owner>-<name>-<short>/` into
//!    `<ws>/<owner>-<name>-<short>.tar.gz` on a blocking worker.
//! 5. Return the archive as a `TarballStream` that owns the workspace.
//!
//! Archiving completes before this fetcher returns, so clone and archive
//! failures surface as `Err` and the workspace is removed right away. Once the
//! stream is handed out, the workspace lives until the stream ends, errors, is
//! canceled or is dropped.
//!
//! ## Authentication
//!
//! A token is passed to git as an `http.extraHeader` through `GIT_CONFIG_*`
//! environment variables (git 2.31+), keeping it out of the command line.
//! Git-over-HTTPS expects Basic credentials: `x-access-token:<token>` on
//! GitHub and `oauth2:<token>` on GitLab.
//!
use super::host::HostConfig;
use super::reference::{Host, RepositoryReference};
use super::strategy::Tier;
use super::tarball::{Tarball, TarballStream};
use super::workspace::EphemeralWorkspace;
use super::{is_commit_hash, Fetcher};
use crate::common::archive::tar::create_prefixed_tarball_cancellable;
use crate::common::process::run_command_capture;
use crate::core::error::{FetchError, FetchResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SHORT_HASH_LEN: usize = 7;
/// Naming component used when the clone's commit cannot be resolved.
const UNRESOLVED_HASH: &str = "HEAD";

pub struct GitArchiveFetcher {
    hosts: HostConfig,
    git: String,
    workspace_root: Option<PathBuf>,
}

impl GitArchiveFetcher {
    pub fn new(hosts: HostConfig) -> Self {
        Self {
            hosts,
            git: "git".to_string(),
            workspace_root: None,
        }
    }

    /// Creates workspaces under `root` instead of the system temp directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Uses a different git executable (name or path).
    #[allow(dead_code)]
    pub fn with_git_executable(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    fn create_workspace(&self) -> FetchResult<EphemeralWorkspace> {
        match &self.workspace_root {
            Some(root) => EphemeralWorkspace::create_in(root),
            None => EphemeralWorkspace::create(),
        }
    }

    async fn git(
        &self,
        args: &[&str],
        cwd: Option<&Path>,
        auth: Option<&str>,
    ) -> FetchResult<String> {
        let envs = git_env(auth);
        let output = run_command_capture(&self.git, args, cwd, &envs).await?;
        if !output.stderr.trim().is_empty() {
            debug!("git: {}", output.stderr.trim());
        }
        Ok(output.stdout)
    }

    async fn shallow_clone(
        &self,
        reference: &RepositoryReference,
        url: &str,
        dest: &Path,
        token: Option<&str>,
    ) -> FetchResult<()> {
        let dest_str = dest.to_string_lossy();
        let mut args = vec!["clone", "--depth", "1", "--quiet"];
        if let Some(branch) = reference.branch() {
            args.push("--branch");
            args.push(branch);
        }
        args.push("--");
        args.push(url);
        args.push(&dest_str);

        let auth = token.map(|t| auth_header(reference.host(), t));
        self.git(&args, None, auth.as_deref())
            .await
            .map(|_| ())
            .map_err(|e| match e {
                FetchError::ToolMissing { .. } => e,
                FetchError::ExternalCommand { output, status, .. } => FetchError::CloneFailure {
                    repo: reference.slug(),
                    message: format!("git exited with status {}: {}", status, output),
                },
                other => FetchError::CloneFailure {
                    repo: reference.slug(),
                    message: other.to_string(),
                },
            })
    }

    /// Short hash of the clone's HEAD, or `HEAD` if it cannot be resolved.
    async fn resolve_short_hash(&self, reference: &RepositoryReference, clone_dir: &Path) -> String {
        match self.git(&["rev-parse", "HEAD"], Some(clone_dir), None).await {
            Ok(stdout) => match short_hash(&stdout) {
                Some(short) => short,
                None => {
                    warn!(
                        "git rev-parse returned no commit for {}; naming archive with '{}'",
                        reference.slug(),
                        UNRESOLVED_HASH
                    );
                    UNRESOLVED_HASH.to_string()
                }
            },
            Err(e) => {
                warn!(
                    "Could not resolve commit of {} ({}); naming archive with '{}'",
                    reference.slug(),
                    e,
                    UNRESOLVED_HASH
                );
                UNRESOLVED_HASH.to_string()
            }
        }
    }
}

#[async_trait]
impl Fetcher for GitArchiveFetcher {
    fn tier(&self) -> Tier {
        Tier::Git
    }

    async fn fetch_tarball(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<Tarball> {
        let workspace = self.create_workspace()?;
        let clone_dir = workspace.path().join("repo");
        let url = self.hosts.clone_url(reference);

        info!("Shallow-cloning {} into {}", url, clone_dir.display());
        self.shallow_clone(reference, &url, &clone_dir, token).await?;

        let short = self.resolve_short_hash(reference, &clone_dir).await;
        let stem = reference.archive_stem(&short);
        let archive_path = workspace.path().join(format!("{}.tar.gz", stem));
        debug!("Archiving {} as {}", clone_dir.display(), archive_path.display());

        // The task owns the workspace until it returns. Dropping this future
        // raises `cancel`, which stops the walk.
        let cancel = CancelOnDrop::default();
        let task_cancel = Arc::clone(&cancel.0);
        let archive_for_task = archive_path.clone();
        let prefix = stem.clone();
        let (workspace, archived) = tokio::task::spawn_blocking(move || {
            let archived = create_prefixed_tarball_cancellable(
                &clone_dir,
                &prefix,
                &archive_for_task,
                &task_cancel,
            );
            (workspace, archived)
        })
        .await
        .map_err(|e| FetchError::ArchiveFailure {
            repo: reference.slug(),
            message: format!("archive task failed: {}", e),
        })?;
        let written = archived.map_err(|e| FetchError::ArchiveFailure {
            repo: reference.slug(),
            message: format!("{:#}", e),
        })?;
        debug!("Archived {} entries", written);

        let file = tokio::fs::File::open(&archive_path)
            .await
            .map_err(|e| FetchError::ArchiveFailure {
                repo: reference.slug(),
                message: format!("cannot open archive: {}", e),
            })?;

        Ok(Tarball {
            name: format!("{}.tar.gz", stem),
            body: TarballStream::from_file(file, workspace),
        })
    }

    /// Lists the remote's refs without cloning and returns the hash for the
    /// branch, or for `HEAD` when no branch is set.
    ///
    /// `--refs` is passed only for named refs: it hides pseudo-refs, so using
    /// it when asking for `HEAD` would never match anything.
    async fn fetch_latest_commit(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<String> {
        let url = self.hosts.clone_url(reference);
        let wanted = reference.ref_or_head();
        let mut args = vec!["ls-remote"];
        if wanted != "HEAD" {
            args.push("--refs");
        }
        args.push(&url);
        args.push(wanted);

        let auth = token.map(|t| auth_header(reference.host(), t));
        let stdout = self.git(&args, None, auth.as_deref()).await?;
        matching_hash(&stdout, wanted).ok_or_else(|| FetchError::RemoteRefNotFound {
            repo: reference.slug(),
            reference: wanted.to_string(),
        })
    }
}

/// Raises its flag when dropped, stopping a blocking archive task.
#[derive(Default)]
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// `Authorization` header git sends for `token` on `host`.
fn auth_header(host: Host, token: &str) -> String {
    let user = match host {
        Host::Github => "x-access-token",
        Host::Gitlab => "oauth2",
    };
    let credentials = STANDARD.encode(format!("{}:{}", user, token));
    format!("Authorization: Basic {}", credentials)
}

/// Environment for a git invocation: never prompt, and pass the optional
/// auth header as one-off config.
fn git_env(header: Option<&str>) -> Vec<(&'static str, &str)> {
    let mut envs = vec![("GIT_TERMINAL_PROMPT", "0")];
    if let Some(header) = header {
        envs.push(("GIT_CONFIG_COUNT", "1"));
        envs.push(("GIT_CONFIG_KEY_0", "http.extraHeader"));
        envs.push(("GIT_CONFIG_VALUE_0", header));
    }
    envs
}

/// Hash of `wanted` in `git ls-remote` output.
///
/// `ls-remote` matches patterns by suffix, so `main` also lists
/// `refs/heads/feature/main`. An exact `refs/heads/` or `refs/tags/` match
/// wins; otherwise the first hash is taken.
fn matching_hash(output: &str, wanted: &str) -> Option<String> {
    let exact = [
        wanted.to_string(),
        format!("refs/heads/{}", wanted),
        format!("refs/tags/{}", wanted),
    ];
    output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(hash, name)| is_commit_hash(hash.trim()) && exact.iter().any(|e| e == name.trim()))
        .map(|(hash, _)| hash.trim().to_ascii_lowercase())
        .or_else(|| first_hash(output))
}

/// First hexadecimal hash token in `git ls-remote` output, lowercased.
fn first_hash(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|token| is_commit_hash(token))
        .map(str::to_ascii_lowercase)
}

/// Seven-character short form of the hash in `git rev-parse` output.
fn short_hash(output: &str) -> Option<String> {
    let full = output.trim();
    if !is_commit_hash(full) {
        return None;
    }
    Some(full[..SHORT_HASH_LEN].to_ascii_lowercase())
}

//! # tplfetch Fetch Pipeline (`fetch`)
//!
//! File: cli/src/fetch/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Everything needed to turn a `RepositoryReference` into files on disk:
//!
//! - **`reference`**: `RepositoryReference` and `Host`, plus parsing of the accepted reference forms.
//! - **`host`**: `HostConfig`, the per-instance host → base URL mapping.
//! - **`workspace`**: `EphemeralWorkspace`, the per-attempt temporary directory of the git fallback.
//! - **`tarball`**: `Tarball` and `TarballStream`, the single-use byte stream both tiers produce.
//! - **`api`**: `TarballApiFetcher`, the primary tier (provider tarball API over HTTP).
//! - **`git`**: `GitArchiveFetcher`, the fallback tier (shallow clone + local archive).
//! - **`extract`**: stages and unpacks a tarball stream into a destination.
//! - **`strategy`**: `FetchStrategy`, the ordered tier list with accumulated failures.
//!
//! ## Architecture
//!
//! Both tiers implement the `Fetcher` trait. `FetchStrategy` holds an ordered
//! `Vec<Box<dyn Fetcher>>` and tries each in turn, so the fallback policy (which
//! tiers, in which order) is plain data.
//!
//! ```rust
//! let hosts = HostConfig::default();
//! let strategy = FetchStrategy::from_tiers(&[Tier::Tarball, Tier::Git], &hosts)?;
//! let reference = RepositoryReference::parse("solidjs/templates/vanilla/basic", Host::Github)?;
//! strategy
//!     .fetch(&reference, &FetchOptions::new("./my-app"))
//!     .await?;
//! ```
//!
pub mod api;
pub mod extract;
pub mod git;
pub mod host;
pub mod reference;
pub mod strategy;
pub mod tarball;
pub mod workspace;

use crate::core::error::FetchResult;
use async_trait::async_trait;
use tarball::Tarball;

pub use host::HostConfig;
pub use reference::{Host, RepositoryReference};
pub use strategy::{FetchOptions, FetchStrategy, Tier};

/// A way of obtaining a repository's contents as a provider-style tarball.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Which tier this fetcher implements; used in logs and failure reports.
    fn tier(&self) -> Tier;

    /// Produces a gzipped tarball of `reference` whose entries sit under a
    /// single `<owner>-<name>-<short>/` directory.
    async fn fetch_tarball(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<Tarball>;

    /// Resolves the full commit hash `reference` currently points at.
    async fn fetch_latest_commit(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<String>;
}

/// Returns true for a hex string of at least 7 characters, in either case.
///
/// Accepts uppercase input from servers; every hash this crate returns or
/// names an archive with is lowercased first.
pub(crate) fn is_commit_hash(token: &str) -> bool {
    token.len() >= 7 && token.chars().all(|c| c.is_ascii_hexdigit())
}

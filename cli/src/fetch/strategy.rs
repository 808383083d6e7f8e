//! # Fetch Strategy (`fetch::strategy`)
//!
//! File: cli/src/fetch/strategy.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `FetchStrategy` is an ordered list of `Fetcher`s ("tiers"). Each operation
//! asks the tiers in order and returns the first success. Every failure is
//! recorded as a `TierFailure`; when a later tier exists a warning names the
//! repository and the tier being tried next. If every tier fails the caller
//! receives one `CompositeFetchFailure` holding all messages verbatim.
//!
//! There are no retries: each tier gets exactly one attempt.
//!
//! ## Operations
//!
//! - **`fetch`**: fetch and extract into `FetchOptions::destination`. Extraction
//!   is part of a tier's attempt, so a corrupt archive from one tier still
//!   lets the next tier run.
//! - **`fetch_tarball`**: first tarball produced, not extracted.
//! - **`latest_commit`**: first commit hash resolved.
//!
use super::api::TarballApiFetcher;
use super::extract::extract_tarball;
use super::git::GitArchiveFetcher;
use super::host::HostConfig;
use super::reference::RepositoryReference;
use super::tarball::Tarball;
use super::Fetcher;
use crate::core::error::{FetchError, FetchResult, TierFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// The available ways of obtaining a repository.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// The provider's tarball download API.
    Tarball,
    /// Shallow clone with the local git executable, archived locally.
    Git,
}

impl Tier {
    pub const DEFAULT_ORDER: [Tier; 2] = [Tier::Tarball, Tier::Git];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tarball => "tarball",
            Tier::Git => "git",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tarball" => Ok(Tier::Tarball),
            "git" => Ok(Tier::Git),
            other => Err(FetchError::Config(format!(
                "Unknown fetch tier '{}' (expected 'tarball' or 'git')",
                other
            ))),
        }
    }
}

/// Where to put a fetched template and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub destination: PathBuf,
    pub auth_token: Option<String>,
}

impl FetchOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }
}

/// What a successful `FetchStrategy::fetch` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// The tier that produced the files.
    pub tier: Tier,
    /// Name of the tarball that was extracted.
    pub tarball_name: String,
}

pub struct FetchStrategy {
    tiers: Vec<Box<dyn Fetcher>>,
}

impl FetchStrategy {
    pub fn new(tiers: Vec<Box<dyn Fetcher>>) -> Self {
        Self { tiers }
    }

    /// Builds the fetchers named by `tiers`, in order, each configured with
    /// its own copy of `hosts`.
    pub fn from_tiers(tiers: &[Tier], hosts: &HostConfig) -> FetchResult<Self> {
        let mut fetchers: Vec<Box<dyn Fetcher>> = Vec::with_capacity(tiers.len());
        for tier in tiers {
            match tier {
                Tier::Tarball => fetchers.push(Box::new(TarballApiFetcher::new(hosts.clone())?)),
                Tier::Git => fetchers.push(Box::new(GitArchiveFetcher::new(hosts.clone()))),
            }
        }
        Ok(Self::new(fetchers))
    }

    /// The configured tier order.
    pub fn tiers(&self) -> Vec<Tier> {
        self.tiers.iter().map(|f| f.tier()).collect()
    }

    /// Fetches `reference` and extracts it into `options.destination`.
    pub async fn fetch(
        &self,
        reference: &RepositoryReference,
        options: &FetchOptions,
    ) -> FetchResult<FetchReport> {
        let token = options.auth_token.as_deref();
        let mut failures = Vec::new();
        for (index, fetcher) in self.tiers.iter().enumerate() {
            info!("Fetching {} via {} tier", reference, fetcher.tier());
            let attempt = async {
                let tarball = fetcher.fetch_tarball(reference, token).await?;
                let name = tarball.name.clone();
                extract_tarball(
                    tarball.body,
                    &options.destination,
                    reference.subdir(),
                    &reference.slug(),
                )
                .await?;
                Ok::<_, FetchError>(name)
            };
            match attempt.await {
                Ok(tarball_name) => {
                    return Ok(FetchReport {
                        tier: fetcher.tier(),
                        tarball_name,
                    })
                }
                Err(e) => self.record_failure(index, reference, e, &mut failures),
            }
        }
        Err(exhausted(reference, failures))
    }

    /// Returns the first tarball any tier produces, without extracting it.
    pub async fn fetch_tarball(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<Tarball> {
        let mut failures = Vec::new();
        for (index, fetcher) in self.tiers.iter().enumerate() {
            match fetcher.fetch_tarball(reference, token).await {
                Ok(tarball) => return Ok(tarball),
                Err(e) => self.record_failure(index, reference, e, &mut failures),
            }
        }
        Err(exhausted(reference, failures))
    }

    /// Resolves the commit `reference` points at, asking tiers in order.
    pub async fn latest_commit(
        &self,
        reference: &RepositoryReference,
        token: Option<&str>,
    ) -> FetchResult<String> {
        let mut failures = Vec::new();
        for (index, fetcher) in self.tiers.iter().enumerate() {
            match fetcher.fetch_latest_commit(reference, token).await {
                Ok(hash) => return Ok(hash),
                Err(e) => self.record_failure(index, reference, e, &mut failures),
            }
        }
        Err(exhausted(reference, failures))
    }

    fn record_failure(
        &self,
        index: usize,
        reference: &RepositoryReference,
        error: FetchError,
        failures: &mut Vec<TierFailure>,
    ) {
        let tier = self.tiers[index].tier();
        match self.tiers.get(index + 1) {
            Some(next) => warn!(
                "{} tier failed for {}: {}; falling back to {} tier",
                tier,
                reference.slug(),
                error,
                next.tier()
            ),
            None => info!("{} tier failed for {}: {}", tier, reference.slug(), error),
        }
        failures.push(TierFailure {
            tier: tier.to_string(),
            message: error.to_string(),
        });
    }
}

fn exhausted(reference: &RepositoryReference, failures: Vec<TierFailure>) -> FetchError {
    FetchError::CompositeFetchFailure {
        repo: reference.slug(),
        failures,
    }
}

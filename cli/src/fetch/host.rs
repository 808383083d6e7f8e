//! # Host Configuration (`fetch::host`)
//!
//! File: cli/src/fetch/host.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `HostConfig` maps each supported hosting provider to the base URL used for
//! clone URLs and API calls. It is an ordinary value: the configuration layer
//! builds one, command handlers may override a single host with `--base-url`,
//! and each fetcher receives its own copy at construction time. Self-hosted
//! GitHub Enterprise / GitLab instances are supported by pointing the base URL
//! at the instance.
//!
use super::reference::{Host, RepositoryReference};

pub const DEFAULT_GITHUB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_GITLAB_BASE_URL: &str = "https://gitlab.com";

/// Base URLs per hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    github: String,
    gitlab: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_BASE_URL, DEFAULT_GITLAB_BASE_URL)
    }
}

impl HostConfig {
    pub fn new(github: &str, gitlab: &str) -> Self {
        Self {
            github: normalize_base_url(github),
            gitlab: normalize_base_url(gitlab),
        }
    }

    /// Returns a copy with `host` pointed at `base_url`.
    pub fn with_base_url(mut self, host: Host, base_url: &str) -> Self {
        let url = normalize_base_url(base_url);
        match host {
            Host::Github => self.github = url,
            Host::Gitlab => self.gitlab = url,
        }
        self
    }

    pub fn base_url(&self, host: Host) -> &str {
        match host {
            Host::Github => &self.github,
            Host::Gitlab => &self.gitlab,
        }
    }

    /// `<base>/<owner>/<name>.git`
    pub fn clone_url(&self, reference: &RepositoryReference) -> String {
        format!(
            "{}/{}/{}.git",
            self.base_url(reference.host()),
            reference.owner(),
            reference.name()
        )
    }

    /// Root of the provider's REST API for `host`.
    ///
    /// The public github.com API lives on its own domain; Enterprise
    /// instances serve it under `/api/v3`.
    pub fn api_root(&self, host: Host) -> String {
        let base = self.base_url(host);
        match host {
            Host::Github if base == DEFAULT_GITHUB_BASE_URL => "https://api.github.com".to_string(),
            Host::Github => format!("{}/api/v3", base),
            Host::Gitlab => format!("{}/api/v4", base),
        }
    }
}

/// Trims whitespace and trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

//! # Repository References (`fetch::reference`)
//!
//! File: cli/src/fetch/reference.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! A `RepositoryReference` identifies a template source: the hosting provider,
//! the `owner/name` pair, an optional branch and an optional subdirectory.
//! References are immutable once built; the `with_*` methods consume and return
//! a new value.
//!
//! ## Accepted Forms
//!
//! ```text
//! owner/name
//! owner/name/sub/dir
//! owner/name#branch
//! github:owner/name
//! gitlab:owner/name/sub#branch
//! https://github.com/owner/name.git
//! ```
//!
//! When no host prefix or recognizable URL is present, the caller-supplied
//! default host is used.
//!
use crate::core::error::{FetchError, FetchResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    Github,
    Gitlab,
}

impl Host {
    pub fn as_str(&self) -> &'static str {
        match self {
            Host::Github => "github",
            Host::Gitlab => "gitlab",
        }
    }

    /// Maps a URL authority such as `github.com` onto a host, if recognized.
    fn from_domain(domain: &str) -> Option<Host> {
        let domain = domain.trim_start_matches("www.");
        match domain {
            "github.com" => Some(Host::Github),
            "gitlab.com" => Some(Host::Gitlab),
            _ => None,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Host {
    type Err = FetchError;

    fn from_str(s: &str) -> FetchResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "github" | "gh" => Ok(Host::Github),
            "gitlab" | "gl" => Ok(Host::Gitlab),
            other => Err(FetchError::InvalidReference {
                input: s.to_string(),
                reason: format!("unknown host '{}' (expected github or gitlab)", other),
            }),
        }
    }
}

/// Identifies a template repository, optionally narrowed to a branch and subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReference {
    host: Host,
    owner: String,
    name: String,
    branch: Option<String>,
    subdir: Option<String>,
}

impl RepositoryReference {
    /// Builds a reference from its parts, validating owner and name.
    pub fn new(host: Host, owner: &str, name: &str) -> FetchResult<Self> {
        let input = format!("{}/{}", owner, name);
        validate_segment(&input, "owner", owner)?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        validate_segment(&input, "name", name)?;
        Ok(Self {
            host,
            owner: owner.to_string(),
            name: name.to_string(),
            branch: None,
            subdir: None,
        })
    }

    /// Returns a copy pinned to `branch`. Empty strings clear the branch.
    pub fn with_branch(mut self, branch: Option<&str>) -> Self {
        self.branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        self
    }

    /// Returns a copy narrowed to `subdir`, normalized to `a/b/c` form.
    pub fn with_subdir(mut self, subdir: Option<&str>) -> FetchResult<Self> {
        self.subdir = match subdir {
            Some(raw) => normalize_subdir(&self.slug(), raw)?,
            None => None,
        };
        Ok(self)
    }

    /// Parses any of the accepted reference forms.
    pub fn parse(input: &str, default_host: Host) -> FetchResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "reference is empty"));
        }

        let (body, branch) = match trimmed.rsplit_once('#') {
            Some((body, branch)) => (body, Some(branch)),
            None => (trimmed, None),
        };

        let (host, path) = split_host(input, body, default_host)?;
        let path = path.trim_matches('/');
        let mut parts = path.split('/');
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        if owner.is_empty() || name.is_empty() {
            return Err(invalid(input, "expected the form owner/name"));
        }
        let rest: Vec<&str> = parts.collect();
        let subdir = if rest.is_empty() {
            None
        } else {
            Some(rest.join("/"))
        };

        let reference = Self::new(host, owner, name).map_err(|e| match e {
            FetchError::InvalidReference { reason, .. } => invalid(input, &reason),
            other => other,
        })?;
        if let Some(b) = branch {
            if b.trim().is_empty() {
                return Err(invalid(input, "branch after '#' is empty"));
            }
        }
        reference.with_branch(branch).with_subdir(subdir.as_deref())
    }

    pub fn host(&self) -> Host {
        self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    /// The ref to ask a remote for: the branch, or `HEAD` for the default branch.
    pub fn ref_or_head(&self) -> &str {
        self.branch.as_deref().unwrap_or("HEAD")
    }

    /// `owner/name`, used in messages.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// `<owner>-<name>-<component>`, the archive stem shared by both fetch tiers.
    pub fn archive_stem(&self, component: &str) -> String {
        format!("{}-{}-{}", self.owner, self.name, component)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.owner, self.name)?;
        if let Some(subdir) = &self.subdir {
            write!(f, "/{}", subdir)?;
        }
        if let Some(branch) = &self.branch {
            write!(f, "#{}", branch)?;
        }
        Ok(())
    }
}

fn invalid(input: &str, reason: &str) -> FetchError {
    FetchError::InvalidReference {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

/// Splits a host prefix or URL authority off the reference body.
fn split_host<'a>(input: &str, body: &'a str, default_host: Host) -> FetchResult<(Host, &'a str)> {
    for scheme in ["https://", "http://"] {
        if let Some(rest) = body.strip_prefix(scheme) {
            let (domain, path) = rest.split_once('/').unwrap_or((rest, ""));
            let host = Host::from_domain(domain).unwrap_or(default_host);
            return Ok((host, path));
        }
    }
    if let Some(rest) = body.strip_prefix("git@") {
        let (domain, path) = rest
            .split_once(':')
            .ok_or_else(|| invalid(input, "ssh form must be git@host:owner/name"))?;
        let host = Host::from_domain(domain).unwrap_or(default_host);
        return Ok((host, path));
    }
    match body.split_once(':') {
        Some((prefix, path)) if !prefix.contains('/') => Ok((prefix.parse()?, path)),
        _ => Ok((default_host, body)),
    }
}

fn validate_segment(input: &str, what: &str, segment: &str) -> FetchResult<()> {
    if segment.is_empty() {
        return Err(invalid(input, &format!("{} is empty", what)));
    }
    if segment == "." || segment == ".." {
        return Err(invalid(input, &format!("{} cannot be '{}'", what, segment)));
    }
    let valid = segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(invalid(
            input,
            &format!("{} '{}' contains unsupported characters", what, segment),
        ));
    }
    Ok(())
}

fn normalize_subdir(repo: &str, raw: &str) -> FetchResult<Option<String>> {
    let mut parts = Vec::new();
    for component in raw.split(['/', '\\']) {
        match component {
            "" => continue,
            "." | ".." => {
                return Err(invalid(
                    repo,
                    &format!("subdirectory '{}' may not contain '.' or '..'", raw),
                ))
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("/")))
    }
}

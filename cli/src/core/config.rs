//! # tplfetch Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module loads, merges and validates the tplfetch configuration: host
//! base URLs, the ordered list of fetch tiers, output defaults and named
//! template aliases.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.tplfetch.toml` in the current directory or an ancestor
//!    (the search stops at a directory containing `.git`)
//! 2. User-specific `~/.config/tplfetch/config.toml`, or the file named by
//!    `TPLFETCH_CONFIG`
//! 3. Default values defined in the code
//!
//! Project values override user values field by field; template aliases from
//! both files are combined, with project aliases replacing user aliases of the
//! same name.
//!
//! ## Examples
//!
//! ```toml
//! [hosts.gitlab]
//! base_url = "https://gitlab.corp.example"
//!
//! [fetch]
//! tiers = ["tarball", "git"]
//!
//! [defaults]
//! host = "github"
//! output_dir = "~/code"
//!
//! [templates.solid]
//! repo = "solidjs/templates"
//! subdir = "vanilla/basic"
//! description = "SolidJS vanilla starter"
//! ```
//!
//! ```rust
//! let cfg = config::load_config()?;
//! let strategy = FetchStrategy::from_tiers(&cfg.tiers()?, &cfg.host_config())?;
//! ```
//!
//! The configuration is loaded once per command execution and passed
//! to the code that needs it.
//!
use crate::core::error::{FetchError, FetchResult, Result};
use crate::fetch::host::normalize_base_url;
use crate::fetch::{Host, HostConfig, RepositoryReference, Tier};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit user configuration file.
pub const CONFIG_ENV_VAR: &str = "TPLFETCH_CONFIG";
const PROJECT_CONFIG_FILENAME: &str = ".tplfetch.toml";

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub hosts: HostsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Named template aliases, keyed by alias.
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Base URL overrides per hosting provider.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostsConfig {
    pub github: Option<HostEntry>,
    pub gitlab: Option<HostEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostEntry {
    pub base_url: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Ordered tier names ("tarball", "git"). Defaults to tarball then git.
    pub tiers: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Host used for references without a host prefix ("github" or "gitlab").
    pub host: Option<String>,
    /// Parent directory for fetched templates when no destination is given (can use ~).
    pub output_dir: Option<String>,
}

/// A named template alias.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Repository reference string, e.g. `solidjs/templates` or `gitlab:group/proj`.
    pub repo: String,
    pub subdir: Option<String>,
    pub branch: Option<String>,
    pub description: Option<String>,
}

impl TemplateConfig {
    /// Resolves the alias to a reference; `subdir`/`branch` here override any
    /// parsed from `repo`.
    pub fn reference(&self, default_host: Host) -> FetchResult<RepositoryReference> {
        let mut reference = RepositoryReference::parse(&self.repo, default_host)?;
        if self.branch.is_some() {
            reference = reference.with_branch(self.branch.as_deref());
        }
        if self.subdir.is_some() {
            reference = reference.with_subdir(self.subdir.as_deref())?;
        }
        Ok(reference)
    }
}

impl Config {
    /// The host → base URL mapping, with overrides applied.
    pub fn host_config(&self) -> HostConfig {
        let mut hosts = HostConfig::default();
        if let Some(entry) = &self.hosts.github {
            hosts = hosts.with_base_url(Host::Github, &entry.base_url);
        }
        if let Some(entry) = &self.hosts.gitlab {
            hosts = hosts.with_base_url(Host::Gitlab, &entry.base_url);
        }
        hosts
    }

    /// The configured tier order.
    pub fn tiers(&self) -> Result<Vec<Tier>> {
        match &self.fetch.tiers {
            Some(names) => parse_tiers(names),
            None => Ok(Tier::DEFAULT_ORDER.to_vec()),
        }
    }

    pub fn default_host(&self) -> Result<Host> {
        match &self.defaults.host {
            Some(name) => Ok(name.parse::<Host>()?),
            None => Ok(Host::Github),
        }
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.defaults.output_dir.as_ref().map(PathBuf::from)
    }

    pub fn template(&self, alias: &str) -> Option<&TemplateConfig> {
        self.templates.get(alias)
    }
}

/// Loads the merged, validated configuration for the current directory.
pub fn load_config() -> Result<Config> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    load_config_from(&current_dir)
}

/// Loads the merged, validated configuration as seen from `start_dir`.
pub fn load_config_from(start_dir: &Path) -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config(start_dir)?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn user_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(explicit));
    }
    match ProjectDirs::from("", "", "tplfetch") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().join("config.toml")),
        None => {
            warn!("Could not determine user config directory.");
            None
        }
    }
}

fn load_user_config() -> Result<Option<Config>> {
    let Some(config_path) = user_config_path() else {
        return Ok(None);
    };
    if config_path.exists() {
        info!("Loading user configuration from: {}", config_path.display());
        load_config_from_path(&config_path).map(Some)
    } else if std::env::var_os(CONFIG_ENV_VAR).is_some_and(|v| !v.is_empty()) {
        Err(anyhow!(FetchError::Config(format!(
            "{} points to '{}', which does not exist",
            CONFIG_ENV_VAR,
            config_path.display()
        ))))
    } else {
        debug!(
            "User configuration file not found at {}",
            config_path.display()
        );
        Ok(None)
    }
}

fn load_project_config(start_dir: &Path) -> Result<Option<Config>> {
    if let Some(project_config_path) = find_project_config_path(start_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!(
            "No project configuration file ({}) found in current directory or ancestors.",
            PROJECT_CONFIG_FILENAME
        );
        Ok(None)
    }
}

fn find_project_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut path: &Path = start_dir;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").exists() {
            debug!(
                "Found .git at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut templates = user.templates;
    templates.extend(project_cfg.templates);
    Config {
        hosts: HostsConfig {
            github: project_cfg.hosts.github.or(user.hosts.github),
            gitlab: project_cfg.hosts.gitlab.or(user.hosts.gitlab),
        },
        fetch: FetchConfig {
            tiers: project_cfg.fetch.tiers.or(user.fetch.tiers),
        },
        defaults: DefaultsConfig {
            host: project_cfg.defaults.host.or(user.defaults.host),
            output_dir: project_cfg.defaults.output_dir.or(user.defaults.output_dir),
        },
        templates,
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(dir) = &mut config.defaults.output_dir {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded output directory: {}", dir);
    }
    for entry in [&mut config.hosts.github, &mut config.hosts.gitlab]
        .into_iter()
        .flatten()
    {
        entry.base_url = normalize_base_url(&entry.base_url);
    }
    Ok(())
}

fn parse_tiers(names: &[String]) -> Result<Vec<Tier>> {
    if names.is_empty() {
        return Err(anyhow!(FetchError::Config(
            "fetch.tiers must name at least one tier".to_string()
        )));
    }
    let mut seen = HashSet::new();
    let mut tiers = Vec::with_capacity(names.len());
    for name in names {
        let tier = name.parse::<Tier>()?;
        if !seen.insert(tier) {
            return Err(anyhow!(FetchError::Config(format!(
                "fetch.tiers lists '{}' more than once",
                tier
            ))));
        }
        tiers.push(tier);
    }
    Ok(tiers)
}

fn validate_config(config: &Config) -> Result<()> {
    debug!("Validating final configuration...");
    for (label, entry) in [("github", &config.hosts.github), ("gitlab", &config.hosts.gitlab)] {
        if let Some(entry) = entry {
            if entry.base_url.is_empty() {
                return Err(anyhow!(FetchError::Config(format!(
                    "hosts.{}.base_url cannot be empty",
                    label
                ))));
            }
        }
    }
    config.tiers()?;
    let default_host = config.default_host()?;
    if let Some(dir) = config.output_dir() {
        if dir.exists() && !dir.is_dir() {
            return Err(anyhow!(FetchError::Config(format!(
                "defaults.output_dir '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    for (alias, template) in &config.templates {
        template
            .reference(default_host)
            .with_context(|| format!("Invalid template alias '{}'", alias))?;
    }
    debug!("Configuration validation successful.");
    Ok(())
}

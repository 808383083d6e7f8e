//! # Shared Command Helpers
//!
//! File: cli/src/commands/utils.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Resolution steps shared by the `fetch`, `archive` and `latest` commands:
//!
//! - **`resolve_reference`**: turns the `SOURCE` argument (template alias or
//!   reference string) into a `RepositoryReference`, applying `--branch` and
//!   `--subdir` overrides.
//! - **`resolve_hosts`**: the configured `HostConfig` with an optional
//!   `--base-url` override for the reference's host.
//! - **`resolve_tiers`**: `--tier` flags, or the configured order.
//! - **`default_dir_name`**: the directory name used when no destination is given.
//!
use crate::core::config::Config;
use crate::core::error::Result;
use crate::fetch::{Host, HostConfig, RepositoryReference, Tier};
use anyhow::Context;
use tracing::debug;

/// Resolves `source` against the configured aliases, falling back to parsing
/// it as a reference string.
///
/// `host` replaces the configured default host for forms without an explicit
/// host prefix or URL.
pub fn resolve_reference(
    cfg: &Config,
    source: &str,
    host: Option<Host>,
    branch: Option<&str>,
    subdir: Option<&str>,
) -> Result<RepositoryReference> {
    let default_host = match host {
        Some(host) => host,
        None => cfg.default_host()?,
    };
    let mut reference = match cfg.template(source) {
        Some(template) => {
            debug!("'{}' is a configured template alias for {}", source, template.repo);
            template
                .reference(default_host)
                .with_context(|| format!("Invalid template alias '{}'", source))?
        }
        None => RepositoryReference::parse(source, default_host)?,
    };
    if branch.is_some() {
        reference = reference.with_branch(branch);
    }
    if subdir.is_some() {
        reference = reference.with_subdir(subdir)?;
    }
    debug!("Resolved source '{}' to {}", source, reference);
    Ok(reference)
}

/// Host mapping for one command, with `base_url` applied to `host`.
pub fn resolve_hosts(cfg: &Config, host: Host, base_url: Option<&str>) -> HostConfig {
    let hosts = cfg.host_config();
    match base_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => hosts.with_base_url(host, url),
        None => hosts,
    }
}

/// The `--tier` flags in order (duplicates dropped), or the configured order.
pub fn resolve_tiers(cfg: &Config, requested: &[Tier]) -> Result<Vec<Tier>> {
    if requested.is_empty() {
        return cfg.tiers();
    }
    let mut tiers = Vec::with_capacity(requested.len());
    for tier in requested {
        if !tiers.contains(tier) {
            tiers.push(*tier);
        }
    }
    Ok(tiers)
}

/// Last subdirectory component, or the repository name.
pub fn default_dir_name(reference: &RepositoryReference) -> &str {
    reference
        .subdir()
        .and_then(|s| s.rsplit('/').next())
        .unwrap_or_else(|| reference.name())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_alias() -> Config {
        toml::from_str(
            r#"
            [defaults]
            host = "gitlab"

            [templates.solid]
            repo = "github:solidjs/templates"
            subdir = "vanilla/basic"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_alias_takes_precedence() {
        let cfg = config_with_alias();
        let reference = resolve_reference(&cfg, "solid", None, None, None).unwrap();
        assert_eq!(reference.host(), Host::Github);
        assert_eq!(reference.slug(), "solidjs/templates");
        assert_eq!(reference.subdir(), Some("vanilla/basic"));
    }

    #[test]
    fn test_overrides_apply_to_alias() {
        let cfg = config_with_alias();
        let reference =
            resolve_reference(&cfg, "solid", None, Some("next"), Some("ts/basic")).unwrap();
        assert_eq!(reference.branch(), Some("next"));
        assert_eq!(reference.subdir(), Some("ts/basic"));
    }

    #[test]
    fn test_raw_reference_uses_default_host() {
        let cfg = config_with_alias();
        let reference = resolve_reference(&cfg, "group/proj", None, None, None).unwrap();
        assert_eq!(reference.host(), Host::Gitlab);

        let reference =
            resolve_reference(&cfg, "group/proj", Some(Host::Github), None, None).unwrap();
        assert_eq!(reference.host(), Host::Github);
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        let cfg = Config::default();
        assert!(resolve_reference(&cfg, "not-a-reference", None, None, None).is_err());
        assert!(resolve_reference(&cfg, "o/n", None, None, Some("../x")).is_err());
    }

    #[test]
    fn test_base_url_override() {
        let cfg = Config::default();
        let hosts = resolve_hosts(&cfg, Host::Gitlab, Some("https://gl.example/"));
        assert_eq!(hosts.base_url(Host::Gitlab), "https://gl.example");
        assert_eq!(hosts.base_url(Host::Github), "https://github.com");
        assert_eq!(resolve_hosts(&cfg, Host::Github, Some("  ")), HostConfig::default());
    }

    #[test]
    fn test_tier_resolution() {
        let cfg = Config::default();
        assert_eq!(resolve_tiers(&cfg, &[]).unwrap(), vec![Tier::Tarball, Tier::Git]);
        assert_eq!(
            resolve_tiers(&cfg, &[Tier::Git, Tier::Git, Tier::Tarball]).unwrap(),
            vec![Tier::Git, Tier::Tarball]
        );
    }

    #[test]
    fn test_default_dir_name() {
        let plain = RepositoryReference::new(Host::Github, "solidjs", "templates").unwrap();
        assert_eq!(default_dir_name(&plain), "templates");
        let nested = plain.with_subdir(Some("vanilla/basic")).unwrap();
        assert_eq!(default_dir_name(&nested), "basic");
    }
}

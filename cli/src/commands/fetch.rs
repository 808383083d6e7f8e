//! # tplfetch Fetch Command
//!
//! File: cli/src/commands/fetch.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements `tplfetch fetch`, which scaffolds a new project by
//! copying a template repository (or one of its subdirectories) into a
//! destination directory. It handles:
//! - Resolving the source (template alias or repository reference)
//! - Choosing and checking the destination directory
//! - Building the fetch strategy from the configured or requested tiers
//! - Printing next steps after the template lands
//!
//! ## Examples
//!
//! ```bash
//! # SolidJS vanilla starter into ./basic
//! tplfetch fetch solidjs/templates/vanilla/basic
//!
//! # A configured alias into a named directory
//! tplfetch fetch solid my-app
//!
//! # A branch of a self-hosted GitLab project, git only
//! tplfetch fetch gitlab:platform/starters -b next --base-url https://gitlab.corp.example --tier git
//! ```
//!
use super::utils;
use crate::common::fs::io::dir_is_empty;
use crate::core::config::{self, Config};
use crate::core::error::Result;
use crate::fetch::strategy::FetchReport;
use crate::fetch::{FetchOptions, FetchStrategy, Host, RepositoryReference, Tier};
use anyhow::Context;
use clap::Parser;
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Template alias or repository reference (owner/name[/subdir][#branch], gitlab:owner/name, URL).
    source: String,

    /// Destination directory. Defaults to <output_dir or current dir>/<template name>.
    destination: Option<PathBuf>,

    /// Branch to fetch instead of the default branch.
    #[arg(long, short = 'b')]
    branch: Option<String>,

    /// Only copy this subdirectory of the repository.
    #[arg(long, short = 's')]
    subdir: Option<String>,

    /// Host for references without a host prefix (github, gitlab).
    #[arg(long)]
    host: Option<Host>,

    /// Base URL of a self-hosted instance for the reference's host.
    #[arg(long)]
    base_url: Option<String>,

    /// Access token for private repositories.
    #[arg(long, env = "TPLFETCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Write into an existing, non-empty destination.
    #[arg(long, short = 'f')]
    force: bool,

    /// Fetch tier to try, in order (repeatable). Overrides the configured order.
    #[arg(long = "tier", value_enum)]
    tiers: Vec<Tier>,
}

pub async fn handle_fetch(args: FetchArgs) -> Result<()> {
    info!("Handling fetch command for '{}'", args.source);
    let cfg = config::load_config().context("Failed to load tplfetch configuration")?;

    let reference = utils::resolve_reference(
        &cfg,
        &args.source,
        args.host,
        args.branch.as_deref(),
        args.subdir.as_deref(),
    )?;
    let destination = resolve_destination(&cfg, args.destination.as_deref(), &reference)?;
    check_destination(&destination, args.force)?;

    let tiers = utils::resolve_tiers(&cfg, &args.tiers)?;
    let hosts = utils::resolve_hosts(&cfg, reference.host(), args.base_url.as_deref());
    let strategy = FetchStrategy::from_tiers(&tiers, &hosts)?;
    debug!("Fetch tiers: {:?}", strategy.tiers());

    let options = FetchOptions::new(&destination).with_auth_token(args.token);
    let report = strategy.fetch(&reference, &options).await?;

    print_completion_message(&destination, &reference, &report);
    Ok(())
}

fn resolve_destination(
    cfg: &Config,
    explicit: Option<&Path>,
    reference: &RepositoryReference,
) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let destination = match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => {
            let base = match cfg.output_dir() {
                Some(dir) if dir.is_absolute() => dir,
                Some(dir) => cwd.join(dir),
                None => cwd,
            };
            base.join(utils::default_dir_name(reference))
        }
    };
    debug!("Resolved destination: {}", destination.display());
    Ok(destination)
}

fn check_destination(destination: &Path, force: bool) -> Result<()> {
    if !destination.exists() {
        return Ok(());
    }
    if !destination.is_dir() {
        anyhow::bail!(
            "Destination '{}' exists but is not a directory.",
            destination.display()
        );
    }
    if dir_is_empty(destination)? {
        return Ok(());
    }
    if force {
        warn!(
            "Destination '{}' is not empty. Proceeding due to --force flag. Existing files may be overwritten.",
            destination.display()
        );
        Ok(())
    } else {
        anyhow::bail!(
            "Destination '{}' is not empty. Use --force to write into it or choose a different destination.",
            destination.display()
        );
    }
}

fn print_completion_message(target_path: &Path, reference: &RepositoryReference, report: &FetchReport) {
    println!("\n✅ Fetched {} ({})", reference, report.tarball_name);
    println!("   Location: {}", target_path.display());
    if report.tier != Tier::Tarball {
        println!("   Via: {} fallback", report.tier);
    }

    println!("\nNext steps:");
    let display_path = match env::current_dir() {
        Ok(cwd) => pathdiff::diff_paths(target_path, &cwd)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| target_path.display().to_string()),
        Err(_) => target_path.display().to_string(),
    };
    println!("  1. Navigate to your project: cd {}", display_path);

    let mut step_number = 2;
    if target_path.join("README.md").exists() {
        println!(
            "  {}. Review project instructions: cat README.md",
            step_number
        );
        step_number += 1;
    }

    if target_path.join("Cargo.toml").exists() {
        println!("  {}. Build the Rust project: cargo build", step_number);
    } else if target_path.join("go.mod").exists() {
        println!(
            "  {}. Tidy Go modules and build: go mod tidy && go build",
            step_number
        );
    } else if target_path.join("package.json").exists() {
        println!(
            "  {}. Install dependencies: npm install (or pnpm install / yarn)",
            step_number
        );
    } else if target_path.join("requirements.txt").exists()
        || target_path.join("pyproject.toml").exists()
    {
        println!(
            "  {}. Install Python dependencies (consider using a virtual environment):",
            step_number
        );
        println!("     python -m venv .venv && source .venv/bin/activate");
        if target_path.join("pyproject.toml").exists() {
            println!("     pip install -e .");
        } else {
            println!("     pip install -r requirements.txt");
        }
    }
}

//! # tplfetch Archive Command
//!
//! File: cli/src/commands/archive.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `tplfetch archive <SOURCE> [OUTPUT_DIR]` saves a template's tarball as
//! `<owner>-<name>-<short>.tar.gz` without extracting it. Whichever tier
//! produces it, the archive has the same layout: a single
//! `<owner>-<name>-<short>/` top-level directory.
//!
//! The file is written under a temporary name and renamed once the stream is
//! fully drained, so an interrupted download never leaves a truncated
//! `.tar.gz` behind.
//!
use super::utils;
use crate::core::config;
use crate::core::error::Result;
use crate::fetch::{FetchStrategy, Host, Tier};
use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use std::{
    env,
    path::{Component, Path, PathBuf},
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Parser, Debug)]
pub struct ArchiveArgs {
    /// Template alias or repository reference.
    source: String,

    /// Directory to write the tarball into. Defaults to the current directory.
    output_dir: Option<PathBuf>,

    /// Branch to archive instead of the default branch.
    #[arg(long, short = 'b')]
    branch: Option<String>,

    /// Host for references without a host prefix (github, gitlab).
    #[arg(long)]
    host: Option<Host>,

    /// Base URL of a self-hosted instance for the reference's host.
    #[arg(long)]
    base_url: Option<String>,

    /// Access token for private repositories.
    #[arg(long, env = "TPLFETCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Fetch tier to try, in order (repeatable). Overrides the configured order.
    #[arg(long = "tier", value_enum)]
    tiers: Vec<Tier>,
}

pub async fn handle_archive(args: ArchiveArgs) -> Result<()> {
    info!("Handling archive command for '{}'", args.source);
    let cfg = config::load_config().context("Failed to load tplfetch configuration")?;

    let reference =
        utils::resolve_reference(&cfg, &args.source, args.host, args.branch.as_deref(), None)?;
    let tiers = utils::resolve_tiers(&cfg, &args.tiers)?;
    let hosts = utils::resolve_hosts(&cfg, reference.host(), args.base_url.as_deref());
    let strategy = FetchStrategy::from_tiers(&tiers, &hosts)?;

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => env::current_dir().context("Failed to get current directory")?,
    };
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("Failed to create '{}'", output_dir.display()))?;

    let token = args.token.as_deref().filter(|t| !t.is_empty());
    let mut tarball = strategy.fetch_tarball(&reference, token).await?;
    let target = output_dir.join(archive_file_name(&tarball.name)?);

    let partial = tempfile::Builder::new()
        .prefix(".tplfetch-archive-")
        .tempfile_in(&output_dir)
        .context("Failed to create temporary archive file")?;
    let mut file = tokio::fs::File::from_std(
        partial
            .reopen()
            .context("Failed to open temporary archive file")?,
    );
    let mut written: u64 = 0;
    while let Some(chunk) = tarball.body.next().await {
        let chunk = chunk.context("Download interrupted")?;
        written += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .context("Failed to write archive")?;
    }
    file.flush().await.context("Failed to write archive")?;
    drop(file);
    partial
        .persist(&target)
        .with_context(|| format!("Failed to save '{}'", target.display()))?;
    debug!("Wrote {} bytes to {}", written, target.display());

    println!("{}", target.display());
    Ok(())
}

/// Accepts `name` only if it is a single plain file name.
fn archive_file_name(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => anyhow::bail!("Refusing to save archive under unsafe name '{}'", name),
    }
}

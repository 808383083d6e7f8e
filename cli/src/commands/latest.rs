//! # tplfetch Latest Command
//!
//! File: cli/src/commands/latest.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `tplfetch latest <SOURCE>` prints the full commit hash a template currently
//! points at (its branch, or the default branch). Useful for pinning a
//! template in scripts. The lookup goes through the same tier order as
//! `fetch`; `--via` restricts it to one tier.
//!
use super::utils;
use crate::core::config;
use crate::core::error::Result;
use crate::fetch::{FetchStrategy, Host, Tier};
use anyhow::Context;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
pub struct LatestArgs {
    /// Template alias or repository reference.
    source: String,

    /// Branch to resolve instead of the default branch.
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

    /// Resolve using only this tier.
    #[arg(long, value_enum)]
    via: Option<Tier>,
}

pub async fn handle_latest(args: LatestArgs) -> Result<()> {
    info!("Handling latest command for '{}'", args.source);
    let cfg = config::load_config().context("Failed to load tplfetch configuration")?;

    let reference =
        utils::resolve_reference(&cfg, &args.source, args.host, args.branch.as_deref(), None)?;
    let tiers = match args.via {
        Some(tier) => vec![tier],
        None => utils::resolve_tiers(&cfg, &[])?,
    };
    let hosts = utils::resolve_hosts(&cfg, reference.host(), args.base_url.as_deref());
    let strategy = FetchStrategy::from_tiers(&tiers, &hosts)?;

    let token = args.token.as_deref().filter(|t| !t.is_empty());
    let hash = strategy.latest_commit(&reference, token).await?;
    println!("{}", hash);
    Ok(())
}

//! # tplfetch Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This file serves as the main entry point for the tplfetch CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! - Each subcommand (`fetch`, `archive`, `latest`, `list`) is a variant in the `Commands` enum
//! - Commands are mapped to handler functions in their respective modules
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! tplfetch --help
//!
//! # Fetch a template and watch the tiers at work
//! tplfetch -vv fetch solidjs/templates/vanilla/basic my-app
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level (or `RUST_LOG`)
//! 3. Route to appropriate command handler
//! 4. Print any error as `Error: ...` and exit with status 1
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Subcommand handlers (fetch, archive, latest, list)
mod common; // Shared utilities (archives, filesystem, processes)
mod core; // Core infrastructure (errors, config)
mod fetch; // Fetch pipeline (references, tiers, strategy, extraction)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "tplfetch",
    about = "Fetch project templates from GitHub and GitLab repositories",
    long_about = "Scaffold new projects from template repositories.\n\
                  Downloads through the provider's tarball API and falls back to a\n\
                  shallow git clone when the API is unavailable.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Copy a template into a new directory
    #[command(alias = "f")]
    Fetch(commands::fetch::FetchArgs),
    /// Save a template's tarball without extracting it
    Archive(commands::archive::ArchiveArgs),
    /// Print the latest commit of a template
    Latest(commands::latest::LatestArgs),
    /// List configured template aliases
    #[command(alias = "ls")]
    List(commands::list::ListArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Fetch(args) => commands::fetch::handle_fetch(args).await,
        Commands::Archive(args) => commands::archive::handle_archive(args).await,
        Commands::Latest(args) => commands::latest::handle_latest(args).await,
        Commands::List(args) => commands::list::handle_list(args).await,
    };

    if let Err(e) = command_result {
        tracing::debug!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

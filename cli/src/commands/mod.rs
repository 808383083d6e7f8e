//! # tplfetch Command Modules
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the tplfetch CLI. Each module
//! defines its own Clap arguments struct and an async `handle_*` function that
//! `main.rs` routes to.
//!
//! ## Commands
//!
//! - `fetch`: Copy a template (or a subdirectory of it) into a new directory
//! - `archive`: Save a template's tarball without extracting it
//! - `latest`: Print the commit a template currently points at
//! - `list`: Show the template aliases from configuration
//!
//! `utils` holds the source, host and tier resolution shared by the commands.
//!

pub mod archive;
pub mod fetch;
pub mod latest;
pub mod list;
pub mod utils;

//! # tplfetch Archive Utilities
//!
//! File: cli/src/common/archive/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! - `tar`: packs a directory into a `.tar.gz` under a single top-level prefix
//! - `extract`: unpacks such an archive, dropping the prefix and optionally
//!   keeping one subdirectory
//!
//! Both are blocking and meant to run on `tokio::task::spawn_blocking`.
//!

pub mod extract;
pub mod tar;

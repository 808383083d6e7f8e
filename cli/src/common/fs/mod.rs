//! # tplfetch Filesystem Utilities
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//!

/// Directory checks and moving staged trees into place.
pub mod io;

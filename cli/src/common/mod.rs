//! # tplfetch Common Utilities
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared, domain-agnostic helpers used by the fetch pipeline and commands:
//!
//! - `archive`: building prefixed tarballs and unpacking them safely
//! - `fs`: small filesystem operations (directory checks, moving staged trees)
//! - `process`: running external tools such as `git` and capturing their output
//!

/// Utilities for creating and extracting gzipped tarballs.
pub mod archive;
/// Utilities for filesystem operations.
pub mod fs;
/// Async execution of external commands with captured output.
pub mod process;

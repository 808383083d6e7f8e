//! # tplfetch Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Foundational pieces used across the application:
//! - `config`: Configuration loading, merging, and validation
//! - `error`: The `FetchError` type and `Result` aliases
//!
//! ```rust
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{FetchError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;

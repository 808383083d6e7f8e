//! # tplfetch Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module defines the error types used throughout tplfetch. There are two
//! layers:
//!
//! - `FetchError`: a `thiserror` enum describing every failure the fetch pipeline
//!   can produce (reference parsing, cloning, archiving, HTTP, extraction...).
//!   Fetchers return it directly so the strategy can record each tier's failure
//!   and build a `CompositeFetchFailure` when all tiers are exhausted.
//! - `Result<T>`: an alias for `anyhow::Result<T>` used by command handlers and
//!   configuration loading, where adding context matters more than matching.
//!
//! ## Examples
//!
//! ```rust
//! // Typed failure inside a fetcher
//! return Err(FetchError::RemoteRefNotFound {
//!     repo: reference.slug(),
//!     reference: "HEAD".into(),
//! });
//!
//! // Context in a command handler
//! let cfg = config::load_config().context("Failed to load tplfetch configuration")?;
//! ```
//!
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single tier's failure, kept in order inside `CompositeFetchFailure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    /// Name of the tier that failed (e.g., "tarball", "git").
    pub tier: String,
    /// The tier's error message, verbatim.
    pub message: String,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.tier, self.message)
    }
}

/// Error type for the fetch pipeline.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid repository reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("Required tool '{tool}' was not found on PATH")]
    ToolMissing { tool: String },

    #[error("Shallow clone of {repo} failed: {message}")]
    CloneFailure { repo: String, message: String },

    #[error("Failed to archive {repo}: {message}")]
    ArchiveFailure { repo: String, message: String },

    #[error("Commit not resolvable for {repo} (ref '{reference}')")]
    RemoteRefNotFound { repo: String, reference: String },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Failed to extract tarball into '{}': {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("Subdirectory '{subdir}' not found in {repo}")]
    SubdirNotFound { repo: String, subdir: String },

    #[error("External command failed: {cmd}, Status: {status}, Output:\n{output}")]
    ExternalCommand {
        cmd: String,
        status: String,
        output: String,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to fetch {repo}: {}", join_failures(failures))]
    CompositeFetchFailure {
        repo: String,
        failures: Vec<TierFailure>,
    },
}

/// Concatenates tier failures so each message appears verbatim, in tier order.
fn join_failures(failures: &[TierFailure]) -> String {
    if failures.is_empty() {
        return "no fetch tiers configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pipeline-level result.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Type alias for Result using anyhow::Error for command handlers and config.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = FetchError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );

        let not_found = FetchError::RemoteRefNotFound {
            repo: "owner/name".into(),
            reference: "HEAD".into(),
        };
        assert_eq!(
            not_found.to_string(),
            "Commit not resolvable for owner/name (ref 'HEAD')"
        );

        let missing = FetchError::ToolMissing { tool: "git".into() };
        assert_eq!(
            missing.to_string(),
            "Required tool 'git' was not found on PATH"
        );
    }

    #[test]
    fn test_composite_failure_embeds_every_message() {
        let err = FetchError::CompositeFetchFailure {
            repo: "solidjs/templates".into(),
            failures: vec![
                TierFailure {
                    tier: "tarball".into(),
                    message: "HTTP 503 from api".into(),
                },
                TierFailure {
                    tier: "git".into(),
                    message: "clone refused".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to fetch solidjs/templates: "));
        assert!(msg.contains("[tarball] HTTP 503 from api"));
        assert!(msg.contains("[git] clone refused"));
        // Primary comes first.
        assert!(msg.find("tarball").unwrap() < msg.find("git").unwrap());
    }

    #[test]
    fn test_composite_failure_without_tiers() {
        let err = FetchError::CompositeFetchFailure {
            repo: "a/b".into(),
            failures: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch a/b: no fetch tiers configured"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FetchError = io.into();
        assert!(matches!(err, FetchError::Io { .. }));
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}

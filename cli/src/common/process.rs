//! # tplfetch Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Thin async wrapper around `tokio::process::Command` for running external
//! tools (currently only `git`) and capturing their output.
//!
//! - stdin is closed, so a tool can never block on an interactive prompt.
//! - Children are spawned with `kill_on_drop(true)`: dropping the future that
//!   awaits them (for example when a caller's deadline fires) terminates the
//!   child process instead of leaving it running against a deleted workspace.
//! - A missing executable maps to `FetchError::ToolMissing`; a non-zero exit
//!   maps to `FetchError::ExternalCommand` carrying the trimmed stderr.
//!
//! ## Usage
//!
//! ```rust
//! let out = process::run_command_capture("git", &["rev-parse", "HEAD"], Some(repo_dir), &[]).await?;
//! println!("{}", out.stdout.trim());
//! ```
//!
use crate::core::error::{FetchError, FetchResult};
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, trace};

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` with `args`, optionally inside `cwd` and with extra `envs`,
/// and captures stdout/stderr.
///
/// ## Errors
///
/// - `FetchError::ToolMissing` if `program` is not on PATH.
/// - `FetchError::ExternalCommand` if the process exits unsuccessfully.
/// - `FetchError::Io` for any other spawn/wait failure.
///
/// Values passed through `envs` never appear in error messages, so secrets
/// belong there rather than in `args`.
pub async fn run_command_capture(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    envs: &[(&str, &str)],
) -> FetchResult<CommandOutput> {
    let command_line = format!("{} {}", program, args.join(" "));
    debug!("Running: {}", command_line);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let output = match cmd.output().await {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FetchError::ToolMissing {
                tool: program.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    trace!("{} stdout: {}", program, stdout.trim());

    if !output.status.success() {
        return Err(FetchError::ExternalCommand {
            cmd: command_line,
            status: output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "terminated by signal".to_string()),
            output: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

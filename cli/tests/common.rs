//! # tplfetch CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration test files. Every test runs the real
//! `tplfetch` binary inside a `TestEnv`: a temporary directory holding
//! - `config.toml`, passed via `TPLFETCH_CONFIG` so the user's own
//!   configuration never leaks in,
//! - `work/`, the working directory (with a `.git` marker so the project
//!   config search stops there),
//! - `tmp/`, used as `TMPDIR` so leftover workspaces can be detected,
//! - `remotes/`, local git repositories served through a `file://` base URL.
//!
//! The tarball API tier cannot talk to `file://` URLs, so pointing
//! `--base-url` at `remotes/` exercises the git fallback fully offline.
//!

#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tempfile::TempDir;

/// Helper to create an `assert_cmd::Command` for the compiled `tplfetch` binary.
pub fn tplfetch_cmd() -> Command {
    Command::cargo_bin("tplfetch").expect("Failed to find tplfetch binary for testing")
}

/// Whether a `git` executable is on PATH. Tests needing it return early otherwise.
pub fn git_available() -> bool {
    process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = process::Command::new("git")
        .args([
            "-c",
            "user.name=tplfetch",
            "-c",
            "user.email=tplfetch@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(out.status.success(), "git {:?} failed: {:?}", args, out);
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

pub struct TestEnv {
    root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create test root");
        fs::create_dir_all(root.path().join("work/.git")).unwrap();
        fs::create_dir_all(root.path().join("tmp")).unwrap();
        fs::create_dir_all(root.path().join("remotes")).unwrap();
        fs::write(root.path().join("config.toml"), "").unwrap();
        Self { root }
    }

    pub fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn tmp(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    /// `file://` URL to use as `--base-url`.
    pub fn base_url(&self) -> String {
        format!("file://{}", self.root.path().join("remotes").display())
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.root.path().join("config.toml"), content).unwrap();
    }

    /// `tplfetch` running in `work/` with isolated config and temp directory.
    pub fn cmd(&self) -> Command {
        let mut cmd = tplfetch_cmd();
        cmd.current_dir(self.work())
            .env("TPLFETCH_CONFIG", self.root.path().join("config.toml"))
            .env("TMPDIR", self.tmp())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("NO_COLOR", "1")
            .env_remove("TPLFETCH_TOKEN")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Creates `remotes/acme/starter.git` with a `main` branch holding a
    /// `vanilla/basic` template and a `dev` branch adding `DEV.md`.
    /// Returns the full hashes of `main` and `dev`.
    pub fn create_starter_remote(&self) -> (String, String) {
        let repo = self.root.path().join("remotes/acme/starter.git");
        fs::create_dir_all(repo.join("vanilla/basic/src")).unwrap();
        git(&repo, &["init", "-q"]);
        git(&repo, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        fs::write(repo.join("README.md"), "# starter\n\nTemplates.\n").unwrap();
        fs::write(
            repo.join("vanilla/basic/package.json"),
            "{\"name\":\"basic\"}",
        )
        .unwrap();
        fs::write(repo.join("vanilla/basic/src/index.ts"), "console.log(1);").unwrap();
        git(&repo, &["add", "-A"]);
        git(&repo, &["commit", "-q", "-m", "initial"]);
        let main = git(&repo, &["rev-parse", "HEAD"]);

        git(&repo, &["checkout", "-q", "-b", "dev"]);
        fs::write(repo.join("vanilla/basic/DEV.md"), "dev").unwrap();
        git(&repo, &["add", "-A"]);
        git(&repo, &["commit", "-q", "-m", "dev"]);
        let dev = git(&repo, &["rev-parse", "HEAD"]);
        git(&repo, &["checkout", "-q", "main"]);
        (main, dev)
    }

    /// Names of entries left in `tmp/` that look like fetch workspaces.
    pub fn leftover_workspaces(&self) -> Vec<String> {
        fs::read_dir(self.tmp())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("tplfetch-"))
            .collect()
    }
}

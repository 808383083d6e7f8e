//! # tplfetch CLI Latest Integration Tests
//!
//! File: cli/tests/latest.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Tests for `tplfetch latest`, resolved through the git tier against local
//! repositories. Tests return early when `git` is not installed.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_latest_default_branch_and_named_branch() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    let (main, dev) = env.create_starter_remote();

    env.cmd()
        .args(["latest", "acme/starter", "--via", "git"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success()
        .stdout(format!("{}\n", main));

    env.cmd()
        .args(["latest", "acme/starter#dev", "--via", "git"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success()
        .stdout(format!("{}\n", dev));
}

#[test]
fn test_latest_falls_back_from_tarball_tier() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    let (main, _) = env.create_starter_remote();

    env.cmd()
        .args(["latest", "acme/starter", "-b", "main"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success()
        .stdout(format!("{}\n", main))
        .stderr(predicate::str::contains("falling back"));
}

#[test]
fn test_latest_unknown_repository_fails() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();

    env.cmd()
        .args(["latest", "acme/missing", "--via", "git"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("acme/missing"));
}

#[test]
fn test_latest_unknown_branch_fails() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();

    env.cmd()
        .args(["latest", "acme/starter", "--via", "git", "-b", "nope"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Commit not resolvable for acme/starter"));
}

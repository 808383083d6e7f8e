//! # tplfetch CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Top-level behavior of the `tplfetch` binary: standard flags, subcommand
//! help, argument errors and configuration errors.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    tplfetch_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    tplfetch_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("fetch")
            .and(predicate::str::contains("archive"))
            .and(predicate::str::contains("latest"))
            .and(predicate::str::contains("list")),
    );
}

#[test]
fn test_fetch_help_shows_options() {
    tplfetch_cmd()
        .args(["fetch", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--branch")
                .and(predicate::str::contains("--subdir"))
                .and(predicate::str::contains("--tier"))
                .and(predicate::str::contains("--base-url")),
        );
}

#[test]
fn test_missing_subcommand_fails() {
    tplfetch_cmd().assert().failure();
}

#[test]
fn test_invalid_reference_is_reported() {
    let env = TestEnv::new();
    env.cmd()
        .args(["fetch", "not-a-reference"])
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::starts_with("Error:")
                .and(predicate::str::contains("Invalid repository reference")),
        );
}

#[test]
fn test_invalid_config_is_reported() {
    let env = TestEnv::new();
    env.write_config("[fetch]\ntiers = [\"ftp\"]\n");
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown fetch tier 'ftp'"));
}

#[test]
fn test_missing_explicit_config_file_is_reported() {
    let env = TestEnv::new();
    env.cmd()
        .env("TPLFETCH_CONFIG", env.tmp().join("nope.toml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

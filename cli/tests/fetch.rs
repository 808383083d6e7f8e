//! # tplfetch CLI Fetch Integration Tests
//!
//! File: cli/tests/fetch.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! End-to-end tests for `tplfetch fetch`. Local repositories stand in for the
//! hosting provider; the tarball tier fails against their `file://` base URL,
//! so these tests cover the fallback path, the composite failure and workspace
//! cleanup. Tests return early when `git` is not installed.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_fetch_subdir_falls_back_to_git() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();

    env.cmd()
        .args(["fetch", "acme/starter/vanilla/basic", "my-app"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetched").and(predicate::str::contains("npm install")))
        .stderr(predicate::str::contains("falling back to git tier"));

    let dest = env.work().join("my-app");
    assert!(dest.is_dir());
    assert!(dest.join("package.json").is_file());
    assert!(dest.join("src").is_dir());
    assert!(!dest.join("README.md").exists());
    assert!(!dest.join("DEV.md").exists());
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn test_fetch_git_tier_only_is_quiet() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();

    env.cmd()
        .args(["fetch", "acme/starter", "--tier", "git", "--branch", "dev"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success()
        .stderr(predicate::str::contains("falling back").not());

    // Default destination is the repository name.
    let dest = env.work().join("starter");
    assert!(dest.join("README.md").is_file());
    assert!(dest.join("vanilla/basic/DEV.md").is_file());
    assert!(!dest.join(".git").exists());
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn test_fetch_double_failure_reports_both_tiers() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();

    env.cmd()
        .args(["fetch", "acme/missing", "out"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("Failed to fetch acme/missing")
                .and(predicate::str::contains("[tarball]"))
                .and(predicate::str::contains("[git]")),
        );

    assert!(!env.work().join("out").exists());
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn test_fetch_missing_subdir_fails_cleanly() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();

    env.cmd()
        .args(["fetch", "acme/starter", "out", "--subdir", "react/basic", "--tier", "git"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Subdirectory 'react/basic' not found"));

    assert!(!env.work().join("out").exists());
    assert!(env.leftover_workspaces().is_empty());
}

#[test]
fn test_fetch_refuses_non_empty_destination() {
    let env = TestEnv::new();
    let dest = env.work().join("taken");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("keep.txt"), "mine").unwrap();

    env.cmd()
        .args(["fetch", "acme/starter", "taken"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "mine");
}

#[test]
fn test_fetch_force_writes_into_existing_destination() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();
    let dest = env.work().join("taken");
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("keep.txt"), "mine").unwrap();

    env.cmd()
        .args(["fetch", "acme/starter/vanilla/basic", "taken", "--force", "--tier", "git"])
        .args(["--base-url", &env.base_url()])
        .assert()
        .success();
    assert!(dest.join("keep.txt").is_file());
    assert!(dest.join("package.json").is_file());
}

#[test]
fn test_fetch_configured_alias() {
    if !git_available() {
        return;
    }
    let env = TestEnv::new();
    env.create_starter_remote();
    env.write_config(&format!(
        r#"
[hosts.github]
base_url = "{}"

[fetch]
tiers = ["git"]

[templates.starter]
repo = "acme/starter"
subdir = "vanilla/basic"
description = "Acme starter"
"#,
        env.base_url()
    ));

    env.cmd().args(["fetch", "starter"]).assert().success();

    // Default destination is the last subdirectory component.
    let dest = env.work().join("basic");
    assert!(dest.join("package.json").is_file());
    assert!(dest.join("src/index.ts").is_file());
}

#[test]
#[ignore] // Requires network access to github.com
fn test_fetch_public_solid_template() {
    let env = TestEnv::new();
    env.cmd()
        .args(["fetch", "solidjs/templates/vanilla/basic", "solid-app"])
        .assert()
        .success();
    let dest = env.work().join("solid-app");
    assert!(dest.join("package.json").is_file());
    assert!(dest.join("src").is_dir());
}

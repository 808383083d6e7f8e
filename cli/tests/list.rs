//! # tplfetch CLI List Integration Tests
//!
//! File: cli/tests/list.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Tests for `tplfetch list`, including project-over-user alias precedence.
//!

mod common;
use common::*;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_list_without_templates() {
    let env = TestEnv::new();
    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No templates configured"));
}

#[test]
fn test_list_shows_user_and_project_aliases() {
    let env = TestEnv::new();
    env.write_config(
        r#"
[templates.solid]
repo = "solidjs/templates"
subdir = "vanilla/basic"
description = "SolidJS vanilla starter"

[templates.shared]
repo = "user/shared"
"#,
    );
    fs::write(
        env.work().join(".tplfetch.toml"),
        r#"
[templates.shared]
repo = "gitlab:team/shared"
description = "Team starter"
"#,
    )
    .unwrap();

    env.cmd().arg("ls").assert().success().stdout(
        predicate::str::contains("solidjs/templates/vanilla/basic")
            .and(predicate::str::contains("SolidJS vanilla starter"))
            .and(predicate::str::contains("gitlab:team/shared"))
            .and(predicate::str::contains("user/shared").not())
            .and(predicate::str::contains("Found 2 template(s)")),
    );
}

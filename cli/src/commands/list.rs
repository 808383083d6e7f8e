//! # tplfetch List Command
//!
//! File: cli/src/commands/list.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `tplfetch list` prints the template aliases defined in the user and project
//! configuration files as a table of name, repository and description.
//!
use crate::core::config::{self, TemplateConfig};
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Parser, Debug)]
pub struct ListArgs {}

pub async fn handle_list(_args: ListArgs) -> Result<()> {
    info!("Handling list command...");
    let cfg = config::load_config().context("Failed to load tplfetch configuration")?;
    print_template_table(&cfg.templates);
    Ok(())
}

/// Repository column: `repo`, plus `/subdir` and `#branch` when set separately.
fn repository_label(template: &TemplateConfig) -> String {
    let mut label = template.repo.clone();
    if let Some(subdir) = &template.subdir {
        label.push('/');
        label.push_str(subdir.trim_matches('/'));
    }
    if let Some(branch) = &template.branch {
        label.push('#');
        label.push_str(branch);
    }
    label
}

fn print_template_table(templates: &BTreeMap<String, TemplateConfig>) {
    if templates.is_empty() {
        println!("\nNo templates configured.\n");
        println!("Add aliases under [templates.<name>] in ~/.config/tplfetch/config.toml or .tplfetch.toml, e.g.:");
        println!("  [templates.solid]");
        println!("  repo = \"solidjs/templates\"");
        println!("  subdir = \"vanilla/basic\"");
        return;
    }

    let rows: Vec<(&str, String, &str)> = templates
        .iter()
        .map(|(name, t)| {
            (
                name.as_str(),
                repository_label(t),
                t.description.as_deref().unwrap_or("-"),
            )
        })
        .collect();

    let name_width = rows
        .iter()
        .map(|(name, _, _)| name.len())
        .max()
        .unwrap_or(10)
        .clamp(10, 30);
    let repo_width = rows
        .iter()
        .map(|(_, repo, _)| repo.len())
        .max()
        .unwrap_or(10)
        .clamp(10, 50);

    println!("\nConfigured Templates:\n");
    println!(
        "{:<nw$} | {:<rw$} | Description",
        "Name",
        "Repository",
        nw = name_width,
        rw = repo_width
    );
    println!(
        "{:-<nw$}-+-{:-<rw$}-+-{:-<30}",
        "",
        "",
        "",
        nw = name_width,
        rw = repo_width
    );
    for (name, repo, description) in &rows {
        println!(
            "{:<nw$} | {:<rw$} | {}",
            name,
            repo,
            description,
            nw = name_width,
            rw = repo_width
        );
    }

    println!("\nFound {} template(s).", rows.len());
    println!("Use 'tplfetch fetch <Name> [DEST]' to use one.");
}

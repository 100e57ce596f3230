//! skr scan - Find importable skills

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::truncate;
use crate::cli::output::emit_ok;
use crate::core::hash;
use crate::engine::{Engine, ScanResult};
use crate::error::Result;

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Local directory to scan instead of the configured roots
    #[arg(conflicts_with = "github")]
    pub path: Option<PathBuf>,

    /// GitHub repository: owner/repo[/path][@ref] or a github.com URL
    #[arg(long, value_name = "REPO")]
    pub github: Option<String>,
}

impl SourceArgs {
    /// Run the scan this source selects.
    pub fn scan(&self, engine: &mut Engine) -> Result<ScanResult> {
        match (&self.path, &self.github) {
            (_, Some(reference)) => engine.scan_remote(reference),
            (Some(path), None) => engine.scan_custom_path(path),
            (None, None) => engine.scan(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Also list candidates that are already imported
    #[arg(long)]
    pub all: bool,
}

pub fn run(ctx: &AppContext, args: &ScanArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let result = args.source.scan(&mut engine)?;

    if ctx.robot_mode {
        return emit_ok(&result);
    }
    scan_human(&result, args.all);
    Ok(())
}

fn scan_human(result: &ScanResult, all: bool) {
    let discoverable = &result.classification.discoverable;
    if discoverable.is_empty() {
        println!("{}", "No new skills found".dimmed());
    } else {
        println!("{:24} {:14} {}", "NAME".bold(), "DIGEST".bold(), "DESCRIPTION".bold());
        println!("{}", "─".repeat(78).dimmed());
        for item in discoverable {
            let c = &item.candidate;
            let marker = match &item.conflict {
                Some(conflict) => format!(
                    " {}",
                    format!("[conflicts with {}]", hash::short(&conflict.existing_id)).yellow()
                ),
                None => String::new(),
            };
            println!(
                "{:24} {:14} {}{}",
                truncate(&c.name, 24),
                hash::short(&c.digest),
                truncate(c.description.as_deref().unwrap_or("-"), 40),
                marker
            );
        }
    }

    if all {
        for c in &result.classification.already_imported {
            println!("{:24} {:14} {}", truncate(&c.name, 24), hash::short(&c.digest), "imported".green());
        }
    }

    println!();
    println!(
        "{} {} new, {} already imported, {} conflict(s)",
        "Total:".dimmed(),
        discoverable.len(),
        result.classification.already_imported.len(),
        result.classification.conflicts()
    );
    for failed in result.sources.iter().filter(|s| !s.is_ok()) {
        println!(
            "{} {}: {}",
            "skipped".yellow(),
            failed.source,
            failed.error.as_deref().unwrap_or("unavailable")
        );
    }
    if result.truncated {
        println!("{}", "Remote listing was truncated; narrow it with a sub-path".yellow());
    }
}

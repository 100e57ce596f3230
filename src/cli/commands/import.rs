//! skr import - Import skills from a source

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::scan::SourceArgs;
use crate::cli::output::emit_ok;
use crate::core::{DiscoveredCandidate, hash};
use crate::dedup::name_key;
use crate::error::{RepoError, Result};
use crate::import::ImportOutcome;

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Skill names to import (repeatable)
    #[arg(long = "name", short = 'n')]
    pub names: Vec<String>,

    /// Import every new skill found
    #[arg(long, conflicts_with = "names")]
    pub all: bool,

    /// Overwrite same-named skills with different content
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    imported: Vec<ImportOutcome>,
    conflicts: Vec<SkippedConflict>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SkippedConflict {
    name: String,
    existing_id: String,
}

pub fn run(ctx: &AppContext, args: &ImportArgs) -> Result<()> {
    if args.names.is_empty() && !args.all {
        return Err(RepoError::InvalidInput(
            "name the skills to import with --name, or pass --all".into(),
        ));
    }

    let mut engine = ctx.engine()?;
    let result = args.source.scan(&mut engine)?;
    let selected = select(result.classification.discoverable.iter().map(|d| &d.candidate), args)?;

    // A single explicit request surfaces the conflict as the command's error.
    if selected.len() == 1 && !args.all {
        let outcome = engine.import_checked(selected[0], args.force)?;
        return report(ctx, ImportSummary {
            imported: vec![outcome],
            conflicts: Vec::new(),
        });
    }

    let mut summary = ImportSummary::default();
    for candidate in selected {
        match engine.import_checked(candidate, args.force) {
            Ok(outcome) => summary.imported.push(outcome),
            Err(RepoError::Conflict { existing_id, .. }) => summary.conflicts.push(SkippedConflict {
                name: candidate.name.clone(),
                existing_id,
            }),
            Err(err) => return Err(err),
        }
    }
    report(ctx, summary)
}

fn select<'a>(
    candidates: impl Iterator<Item = &'a DiscoveredCandidate>,
    args: &ImportArgs,
) -> Result<Vec<&'a DiscoveredCandidate>> {
    let candidates: Vec<_> = candidates.collect();
    if args.all {
        return Ok(candidates);
    }
    args.names
        .iter()
        .map(|wanted| {
            let key = name_key(wanted);
            candidates
                .iter()
                .find(|c| name_key(&c.name) == key)
                .copied()
                .ok_or_else(|| RepoError::SkillNotFound(format!("no new skill named '{wanted}' in source")))
        })
        .collect()
}

fn report(ctx: &AppContext, summary: ImportSummary) -> Result<()> {
    if ctx.robot_mode {
        return emit_ok(&summary);
    }

    if summary.imported.is_empty() && summary.conflicts.is_empty() {
        println!("{}", "Nothing to import".dimmed());
        return Ok(());
    }
    for outcome in &summary.imported {
        let migrated = outcome
            .migrated_from
            .as_deref()
            .map(|old| format!(" (replaces {})", hash::short(old)))
            .unwrap_or_default();
        println!(
            "{} {} {}{}",
            "imported".green(),
            outcome.name,
            hash::short(&outcome.id).dimmed(),
            migrated
        );
    }
    for conflict in &summary.conflicts {
        println!(
            "{} {} conflicts with {}; re-run with --force to overwrite",
            "skipped".yellow(),
            conflict.name,
            hash::short(&conflict.existing_id)
        );
    }
    Ok(())
}

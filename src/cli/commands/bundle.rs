//! skr bundle - Export and import portable skill bundles

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::bundle::ExportSelection;
use crate::cli::commands::resolve_preset;
use crate::cli::output::emit_ok;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Write skills and presets to a directory or .zip archive
    Export(ExportArgs),

    /// Import a bundle directory or .zip archive
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination; a path ending in .zip produces an archive.
    /// Defaults to the stored export path.
    pub dest: Option<PathBuf>,

    /// Export only these skills (repeatable)
    #[arg(long = "skill", short, conflicts_with = "presets")]
    pub skills: Vec<String>,

    /// Export these presets and their members (repeatable)
    #[arg(long = "preset", short)]
    pub presets: Vec<String>,

    /// Remember the destination as the default export path
    #[arg(long, requires = "dest")]
    pub set_default: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Bundle directory or .zip archive
    pub source: PathBuf,

    /// Replace same-named skills and presets
    #[arg(long, short)]
    pub force: bool,

    /// Keep carried preset skill ids when they all resolve
    #[arg(long)]
    pub as_is: bool,
}

pub fn run(ctx: &AppContext, args: &BundleArgs) -> Result<()> {
    match &args.command {
        BundleCommand::Export(export) => run_export(ctx, export),
        BundleCommand::Import(import) => run_import(ctx, import),
    }
}

fn run_export(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let mut engine = ctx.engine()?;

    let selection = if !args.skills.is_empty() {
        let mut ids = Vec::with_capacity(args.skills.len());
        for reference in &args.skills {
            ids.push(engine.resolve_skill_ref(reference)?.id);
        }
        ExportSelection::Skills(ids)
    } else if !args.presets.is_empty() {
        let mut ids = Vec::with_capacity(args.presets.len());
        for reference in &args.presets {
            ids.push(resolve_preset(&mut engine, reference)?.id);
        }
        ExportSelection::Presets(ids)
    } else {
        ExportSelection::All
    };

    let report = engine.export_bundle(&selection, args.dest.as_deref())?;
    if args.set_default {
        engine.set_default_export_path(&report.destination)?;
    }

    if ctx.robot_mode {
        return emit_ok(&report);
    }
    println!(
        "{} {} skill(s) and {} preset(s) to {}",
        "exported".green(),
        report.skills,
        report.presets,
        report.destination.display()
    );
    Ok(())
}

fn run_import(ctx: &AppContext, args: &ImportArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let report = engine.import_bundle(&args.source, args.force, args.as_is)?;

    if ctx.robot_mode {
        return emit_ok(&report);
    }
    println!(
        "{} skills: {} imported, {} overwritten, {} skipped",
        "bundle".bold(),
        report.skills_imported,
        report.skills_overwritten,
        report.skills_skipped
    );
    println!(
        "{} presets: {} imported, {} overwritten, {} skipped",
        "bundle".bold(),
        report.presets_imported,
        report.presets_overwritten,
        report.presets_skipped
    );
    if !args.force && (report.skills_skipped > 0 || report.presets_skipped > 0) {
        println!("{}", "Re-run with --force to replace skipped entries".dimmed());
    }
    Ok(())
}

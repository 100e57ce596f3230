//! skr preset - Manage named skill sets

use std::path::PathBuf;

use clap::{Args, Subcommand};
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::{resolve_preset, truncate};
use crate::cli::output::emit_ok;
use crate::error::Result;
use crate::preset::{ApplyMode, PresetDraft};
use crate::storage::Preset;

#[derive(Args, Debug)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// List presets
    List,

    /// Create or update a preset
    Save(SaveArgs),

    /// Delete a preset
    Delete {
        /// Preset id or name
        preset: String,
    },

    /// Copy a preset's skills into a directory
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Preset name
    pub name: String,

    /// Update the preset with this id instead of creating one
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long, short)]
    pub description: Option<String>,

    /// Member skill (id, id prefix, or name; repeatable)
    #[arg(long = "skill", short)]
    pub skills: Vec<String>,

    /// Replace another preset that already uses this name
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Preset id or name
    pub preset: String,

    /// Target directory
    pub target: PathBuf,

    #[arg(long, value_enum, default_value_t = ApplyMode::Merge)]
    pub mode: ApplyMode,
}

pub fn run(ctx: &AppContext, args: &PresetArgs) -> Result<()> {
    match &args.command {
        PresetCommand::List => run_list(ctx),
        PresetCommand::Save(save) => run_save(ctx, save),
        PresetCommand::Delete { preset } => run_delete(ctx, preset),
        PresetCommand::Apply(apply) => run_apply(ctx, apply),
    }
}

fn run_list(ctx: &AppContext) -> Result<()> {
    let mut engine = ctx.engine()?;
    let presets = engine.list_presets()?;

    if ctx.robot_mode {
        return emit_ok(serde_json::json!({
            "count": presets.len(),
            "presets": presets,
        }));
    }

    if presets.is_empty() {
        println!("{}", "No presets".dimmed());
        return Ok(());
    }
    for preset in &presets {
        print_preset(preset);
    }
    Ok(())
}

fn run_save(ctx: &AppContext, args: &SaveArgs) -> Result<()> {
    let mut engine = ctx.engine()?;

    let mut skill_ids = Vec::with_capacity(args.skills.len());
    for reference in &args.skills {
        skill_ids.push(engine.resolve_skill_ref(reference)?.id);
    }

    // An update keeps whatever the flags leave unspecified.
    let existing = match &args.id {
        Some(id) => engine.list_presets()?.into_iter().find(|p| &p.id == id),
        None => None,
    };
    let mut description = args.description.clone();
    if let Some(existing) = existing {
        if args.skills.is_empty() {
            skill_ids = existing.skill_ids;
        }
        if description.is_none() {
            description = existing.description;
        }
    }

    let draft = PresetDraft {
        id: args.id.clone(),
        name: args.name.clone(),
        description,
        skill_ids,
    };
    let saved = engine.save_preset(draft, args.force)?;

    if ctx.robot_mode {
        return emit_ok(&saved);
    }
    println!("{} preset {}", "saved".green(), saved.name.bold());
    print_preset(&saved);
    Ok(())
}

fn run_delete(ctx: &AppContext, reference: &str) -> Result<()> {
    let mut engine = ctx.engine()?;
    let preset = resolve_preset(&mut engine, reference)?;
    let removed = engine.delete_preset(&preset.id)?;

    if ctx.robot_mode {
        return emit_ok(&removed);
    }
    println!("{} preset {}", "deleted".red(), removed.name);
    Ok(())
}

fn run_apply(ctx: &AppContext, args: &ApplyArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let preset = resolve_preset(&mut engine, &args.preset)?;
    let report = engine.apply_preset(&preset.id, args.mode, &args.target)?;

    if ctx.robot_mode {
        return emit_ok(&report);
    }
    println!(
        "{} {} skill(s) from {} into {}",
        "copied".green(),
        report.copied.len(),
        preset.name.bold(),
        args.target.display()
    );
    for id in &report.missing {
        println!("{} missing member {}", "warning:".yellow(), id);
    }
    Ok(())
}

fn print_preset(preset: &Preset) {
    println!(
        "{} {} {}",
        preset.name.bold(),
        format!("({} skill(s))", preset.skill_ids.len()).dimmed(),
        preset.id.dimmed()
    );
    if let Some(description) = preset.description.as_deref().filter(|d| !d.is_empty()) {
        println!("  {}", truncate(description, 76));
    }
}

//! skr reconcile - Drop metadata for skills no longer on disk

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_ok;
use crate::core::hash;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ReconcileArgs {}

pub fn run(ctx: &AppContext, _args: &ReconcileArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let report = engine.reconcile()?;

    if ctx.robot_mode {
        return emit_ok(&report);
    }
    if !report.changed() {
        println!("{}", "Repository is consistent".dimmed());
        return Ok(());
    }
    for id in &report.pruned_skills {
        println!("{} {}", "pruned".yellow(), hash::short(id));
    }
    if report.pruned_preset_refs > 0 {
        println!(
            "{} {} stale preset reference(s)",
            "removed".yellow(),
            report.pruned_preset_refs
        );
    }
    Ok(())
}

//! skr delete - Remove an imported skill

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::emit_ok;
use crate::core::hash;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Skill id, id prefix, or name
    pub skill: String,
}

pub fn run(ctx: &AppContext, args: &DeleteArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let skill = engine.resolve_skill_ref(&args.skill)?;
    let removed = engine.delete_skill(&skill.id)?;

    if ctx.robot_mode {
        return emit_ok(&removed);
    }
    println!(
        "{} {} {}",
        "deleted".red(),
        removed.name,
        hash::short(&removed.id).dimmed()
    );
    Ok(())
}

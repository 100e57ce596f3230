//! skr show - Show one skill

use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::join_or_dash;
use crate::cli::output::{HumanLayout, emit_human, emit_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Skill id, id prefix, or name
    pub skill: String,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let skill = engine.resolve_skill_ref(&args.skill)?;
    let presets: Vec<String> = engine
        .list_presets()?
        .into_iter()
        .filter(|p| p.skill_ids.contains(&skill.id))
        .map(|p| p.name)
        .collect();

    if ctx.robot_mode {
        return emit_ok(serde_json::json!({
            "skill": skill,
            "presets": presets,
        }));
    }

    let mut layout = HumanLayout::new();
    layout
        .title(&skill.name)
        .kv("id", &skill.id)
        .kv("path", &skill.path.display().to_string())
        .kv("description", skill.description.as_deref().unwrap_or("-"))
        .kv("tags", &join_or_dash(&skill.tags))
        .kv("source", skill.source.as_deref().unwrap_or("-"))
        .kv(
            "imported",
            &skill
                .imported_at
                .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        )
        .kv("presets", &join_or_dash(&presets));
    emit_human(layout);
    Ok(())
}

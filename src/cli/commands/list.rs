//! skr list - List imported skills

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::{join_or_dash, resolve_preset, truncate};
use crate::cli::output::emit_ok;
use crate::core::{Skill, hash};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by tags (any match)
    #[arg(long = "tag", short)]
    pub tags: Vec<String>,

    /// Only skills in this preset (id or name)
    #[arg(long)]
    pub preset: Option<String>,

    /// Sort by: name, imported
    #[arg(long, default_value = "name")]
    pub sort: String,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let mut skills = engine.list_skills()?;

    if let Some(reference) = &args.preset {
        let preset = resolve_preset(&mut engine, reference)?;
        skills.retain(|s| preset.skill_ids.contains(&s.id));
    }

    if !args.tags.is_empty() {
        let wanted: Vec<String> = args.tags.iter().map(|t| t.trim().to_lowercase()).collect();
        skills.retain(|s| s.tags.iter().any(|t| wanted.contains(&t.to_lowercase())));
    }

    match args.sort.as_str() {
        "imported" => skills.sort_by(|a, b| b.imported_at.cmp(&a.imported_at)),
        _ => skills.sort_by_key(|s| s.name.to_lowercase()),
    }

    if ctx.robot_mode {
        return emit_ok(serde_json::json!({
            "count": skills.len(),
            "skills": skills,
        }));
    }

    list_human(&skills);
    Ok(())
}

fn list_human(skills: &[Skill]) {
    if skills.is_empty() {
        println!("{}", "No skills found".dimmed());
        return;
    }

    println!(
        "{:14} {:24} {:20} {}",
        "ID".bold(),
        "NAME".bold(),
        "TAGS".bold(),
        "DESCRIPTION".bold()
    );
    println!("{}", "─".repeat(90).dimmed());

    for skill in skills {
        println!(
            "{:14} {:24} {:20} {}",
            hash::short(&skill.id).cyan(),
            truncate(&skill.name, 24),
            truncate(&join_or_dash(&skill.tags), 20),
            truncate(skill.description.as_deref().unwrap_or("-"), 40).dimmed()
        );
    }

    println!();
    println!("{} {} skill(s)", "Total:".dimmed(), skills.len());
}

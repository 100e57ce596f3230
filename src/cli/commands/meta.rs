//! skr meta - Edit a skill's tags and display overrides

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::commands::join_or_dash;
use crate::cli::output::emit_ok;
use crate::core::hash;
use crate::engine::MetadataPatch;
use crate::error::{RepoError, Result};

#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Skill id, id prefix, or name
    pub skill: String,

    /// Replace the tag list (repeatable)
    #[arg(long = "tag", conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Add a tag (repeatable)
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,

    /// Remove a tag (repeatable)
    #[arg(long = "remove-tag")]
    pub remove_tags: Vec<String>,

    /// Remove every tag
    #[arg(long)]
    pub clear_tags: bool,

    /// Display name override; an empty value clears it
    #[arg(long)]
    pub name: Option<String>,

    /// Description override; an empty value clears it
    #[arg(long)]
    pub description: Option<String>,
}

impl MetaArgs {
    fn touches_tags(&self) -> bool {
        self.clear_tags || !self.tags.is_empty() || !self.add_tags.is_empty() || !self.remove_tags.is_empty()
    }

    /// Build the patch against the skill's current tags.
    fn patch(&self, current: &[String]) -> MetadataPatch {
        let tags = self.touches_tags().then(|| {
            let mut tags: Vec<String> = if self.clear_tags {
                Vec::new()
            } else if self.tags.is_empty() {
                current.to_vec()
            } else {
                self.tags.clone()
            };
            tags.extend(self.add_tags.iter().cloned());
            let removed: Vec<String> = self.remove_tags.iter().map(|t| t.trim().to_lowercase()).collect();
            tags.retain(|t| !removed.contains(&t.trim().to_lowercase()));
            tags
        });

        MetadataPatch {
            tags,
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

pub fn run(ctx: &AppContext, args: &MetaArgs) -> Result<()> {
    let mut engine = ctx.engine()?;
    let skill = engine.resolve_skill_ref(&args.skill)?;

    let patch = args.patch(&skill.tags);
    if patch == MetadataPatch::default() {
        return Err(RepoError::InvalidInput(
            "nothing to change; pass --tag, --add-tag, --remove-tag, --clear-tags, --name or --description".into(),
        ));
    }

    let updated = engine.update_metadata(&skill.id, patch)?;

    if ctx.robot_mode {
        return emit_ok(&updated);
    }

    println!(
        "{} {} {}",
        "updated".green(),
        updated.name,
        hash::short(&updated.id).dimmed()
    );
    println!("  tags: {}", join_or_dash(&updated.tags));
    Ok(())
}

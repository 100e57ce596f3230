//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::dedup::name_key;
use crate::engine::Engine;
use crate::error::{RepoError, Result};
use crate::storage::Preset;

pub mod bundle;
pub mod config;
pub mod delete;
pub mod import;
pub mod list;
pub mod meta;
pub mod preset;
pub mod reconcile;
pub mod scan;
pub mod show;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Scan(args) => scan::run(ctx, args),
        Commands::Import(args) => import::run(ctx, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Meta(args) => meta::run(ctx, args),
        Commands::Delete(args) => delete::run(ctx, args),
        Commands::Preset(args) => preset::run(ctx, args),
        Commands::Bundle(args) => bundle::run(ctx, args),
        Commands::Reconcile(args) => reconcile::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
    }
}

/// Find a preset by id, or by case-insensitive name.
pub(crate) fn resolve_preset(engine: &mut Engine, reference: &str) -> Result<Preset> {
    let presets = engine.list_presets()?;
    if let Some(preset) = presets.iter().find(|p| p.id == reference) {
        return Ok(preset.clone());
    }
    let key = name_key(reference);
    presets
        .into_iter()
        .find(|p| name_key(&p.name) == key)
        .ok_or_else(|| RepoError::PresetNotFound(reference.to_string()))
}

/// `a, b, c` or `-`.
pub(crate) fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Cut `text` to `max` characters, marking the cut with `…`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// skr - keep a content-addressed repository of agent skills
#[derive(Parser, Debug)]
#[command(name = "skr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON on stdout instead of formatted text
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file path (default: ~/.config/skillrepo/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root (overrides settings and SKR_ROOT)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Workspace roots to scan (default: current directory)
    #[arg(long = "workspace", short = 'w', global = true)]
    pub workspaces: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan sources for skills not yet imported
    Scan(commands::scan::ScanArgs),

    /// Import skills from a source
    Import(commands::import::ImportArgs),

    /// List imported skills
    List(commands::list::ListArgs),

    /// Show one skill
    Show(commands::show::ShowArgs),

    /// Edit tags, name or description of a skill
    Meta(commands::meta::MetaArgs),

    /// Delete an imported skill
    Delete(commands::delete::DeleteArgs),

    /// Manage presets
    Preset(commands::preset::PresetArgs),

    /// Export or import bundles
    Bundle(commands::bundle::BundleArgs),

    /// Prune metadata and preset entries for skills missing on disk
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Show resolved settings
    Config(commands::config::ConfigArgs),
}

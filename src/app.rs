//! Per-invocation context shared by CLI commands.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

pub struct AppContext {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub robot_mode: bool,
    pub workspaces: Vec<PathBuf>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load(cli.config.as_deref())?;
        if let Some(root) = &cli.root {
            config.storage.root = root.display().to_string();
        }

        let workspaces = if cli.workspaces.is_empty() {
            std::env::current_dir().map(|dir| vec![dir]).unwrap_or_default()
        } else {
            cli.workspaces.clone()
        };

        Ok(Self {
            config,
            config_path: cli
                .config
                .clone()
                .or_else(|| std::env::var_os("SKR_CONFIG").map(PathBuf::from))
                .or_else(Config::global_path),
            robot_mode: cli.robot,
            workspaces,
        })
    }

    /// Open the repository for one command.
    pub fn engine(&self) -> Result<Engine> {
        Engine::open(self.config.clone(), self.workspaces.clone())
    }
}

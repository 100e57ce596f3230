use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::MANIFEST_FILE;
use crate::error::{RepoError, Result};
use crate::utils::fs::expand_path;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_MAX_REMOTE_CANDIDATES: usize = 100;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load settings: defaults, then the TOML file, then `SKR_*` environment
    /// overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SKR_CONFIG").ok().map(PathBuf::from));

        let patch = match explicit {
            Some(path) => Self::load_patch(&path)?,
            None => Self::load_global()?,
        };
        if let Some(patch) = patch {
            config.merge_patch(patch);
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Path of the user-level settings file, if a config dir exists.
    #[must_use]
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skillrepo/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| RepoError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| RepoError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.scan {
            self.scan.merge(patch);
        }
        if let Some(patch) = patch.remote {
            self.remote.merge(patch);
        }
        if let Some(patch) = patch.watch {
            self.watch.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let env = EnvReader { lookup };

        if let Some(value) = env.string("SKR_ROOT") {
            self.storage.root = value;
        }
        if let Some(value) = env.string("SKR_LEGACY_ROOT") {
            self.storage.legacy_root = Some(value);
        }

        if let Some(values) = env.list("SKR_SCAN_GLOBAL") {
            self.scan.global = merge_unique(values, &self.scan.global);
        }
        if let Some(values) = env.list("SKR_SCAN_WORKSPACE") {
            self.scan.workspace = merge_unique(values, &self.scan.workspace);
        }
        if let Some(value) = env.parsed::<usize>("SKR_SCAN_MAX_DEPTH")? {
            self.scan.max_depth = value;
        }

        if let Some(value) = env.string("SKR_GITHUB_API") {
            self.remote.api_base = value;
        }
        if let Some(value) = env.string("SKR_GITHUB_TOKEN") {
            self.remote.token = Some(value);
        }
        if let Some(value) = env.parsed::<usize>("SKR_REMOTE_MAX_CANDIDATES")? {
            self.remote.max_candidates = value;
        }

        Ok(())
    }

    /// Resolved storage root.
    #[must_use]
    pub fn root_path(&self) -> PathBuf {
        expand_path(&self.storage.root)
    }

    #[must_use]
    pub fn legacy_root_path(&self) -> Option<PathBuf> {
        self.storage.legacy_root.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: String,
    /// Older storage root copied in when `root` has no document yet.
    #[serde(default)]
    pub legacy_root: Option<String>,
}

fn default_root() -> String {
    "~/.local/share/skillrepo".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            legacy_root: None,
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.root {
            self.root = value;
        }
        if let Some(value) = patch.legacy_root {
            self.legacy_root = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// User-wide skill directories.
    #[serde(default)]
    pub global: Vec<String>,
    /// Locations relative to each workspace root.
    #[serde(default)]
    pub workspace: Vec<String>,
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default)]
    pub manifest_file: String,
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            global: vec!["~/.claude/skills".to_string(), "~/.codex/skills".to_string()],
            workspace: vec![
                ".claude/skills".to_string(),
                ".github/skills".to_string(),
                "skills".to_string(),
            ],
            max_depth: 4,
            manifest_file: MANIFEST_FILE.to_string(),
            ignore_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
            ],
        }
    }
}

impl ScanConfig {
    fn merge(&mut self, patch: ScanPatch) {
        if let Some(values) = patch.global {
            self.global = merge_unique(values, &self.global);
        }
        if let Some(values) = patch.workspace {
            self.workspace = merge_unique(values, &self.workspace);
        }
        if let Some(value) = patch.max_depth {
            self.max_depth = value;
        }
        if let Some(value) = patch.manifest_file {
            self.manifest_file = value;
        }
        if let Some(values) = patch.ignore_dirs {
            self.ignore_dirs = merge_unique(values, &self.ignore_dirs);
        }
    }

    /// Global roots with `~` expanded.
    #[must_use]
    pub fn global_roots(&self) -> Vec<PathBuf> {
        self.global.iter().map(|p| expand_path(p)).collect()
    }

    /// Configured locations under each workspace root.
    #[must_use]
    pub fn workspace_roots(&self, workspaces: &[PathBuf]) -> Vec<PathBuf> {
        workspaces
            .iter()
            .flat_map(|ws| self.workspace.iter().map(move |rel| ws.join(rel)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub max_candidates: usize,
    /// Probed one level deep before falling back to a full tree listing.
    #[serde(default)]
    pub conventional_paths: Vec<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            max_candidates: DEFAULT_MAX_REMOTE_CANDIDATES,
            conventional_paths: vec![
                "skills".to_string(),
                ".claude/skills".to_string(),
                ".codex/skills".to_string(),
                ".github/skills".to_string(),
                String::new(),
            ],
            token: None,
        }
    }
}

impl RemoteConfig {
    fn merge(&mut self, patch: RemotePatch) {
        if let Some(value) = patch.api_base {
            self.api_base = value;
        }
        if let Some(value) = patch.max_candidates {
            self.max_candidates = value;
        }
        if let Some(values) = patch.conventional_paths {
            self.conventional_paths = values;
        }
        if let Some(value) = patch.token {
            self.token = Some(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl WatchConfig {
    fn merge(&mut self, patch: WatchPatch) {
        if let Some(value) = patch.debounce_ms {
            self.debounce_ms = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub scan: Option<ScanPatch>,
    pub remote: Option<RemotePatch>,
    pub watch: Option<WatchPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub root: Option<String>,
    pub legacy_root: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ScanPatch {
    pub global: Option<Vec<String>>,
    pub workspace: Option<Vec<String>>,
    pub max_depth: Option<usize>,
    pub manifest_file: Option<String>,
    pub ignore_dirs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RemotePatch {
    pub api_base: Option<String>,
    pub max_candidates: Option<usize>,
    pub conventional_paths: Option<Vec<String>>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WatchPatch {
    pub debounce_ms: Option<u64>,
}

fn merge_unique(values: Vec<String>, existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values.into_iter().chain(existing.iter().cloned()) {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|err| RepoError::Config(format!("invalid {key} value {value}: {err}"))),
            None => Ok(None),
        }
    }

    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.string(key).map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(ToString::to_string)
                .collect()
        })
    }
}

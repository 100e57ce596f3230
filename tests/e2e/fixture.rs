//! E2E test fixture with step logging.

use std::path::{Path, PathBuf};
use std::time::Instant;

use skillrepo::Engine;
use skillrepo::config::Config;
use skillrepo::import::ImportOutcome;
use tempfile::TempDir;

/// Isolated environment: a storage root plus one global source directory.
pub struct E2EFixture {
    pub scenario_name: String,
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub repo_root: PathBuf,
    pub source_dir: PathBuf,
    start_time: Instant,
    step_count: usize,
}

impl E2EFixture {
    pub fn new(scenario_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let repo_root = root.join("repo");
        let source_dir = root.join("source");
        std::fs::create_dir_all(&source_dir).expect("Failed to create source dir");

        println!();
        println!("{}", "█".repeat(70));
        println!("█ E2E SCENARIO: {scenario_name}");
        println!("{}", "█".repeat(70));
        println!("[E2E] Root: {}", root.display());

        Self {
            scenario_name: scenario_name.to_string(),
            temp_dir,
            root,
            repo_root,
            source_dir,
            start_time: Instant::now(),
            step_count: 0,
        }
    }

    pub fn log_step(&mut self, description: &str) {
        self.step_count += 1;
        println!();
        println!("┌{}", "─".repeat(68));
        println!("│ STEP {}: {}", self.step_count, description);
        println!("│ Time: {:?}", self.start_time.elapsed());
        println!("└{}", "─".repeat(68));
    }

    pub fn config_for(&self, repo_root: &Path) -> Config {
        let mut config = Config::default();
        config.storage.root = repo_root.display().to_string();
        config.storage.legacy_root = None;
        config.scan.global = vec![self.source_dir.display().to_string()];
        config.scan.workspace = Vec::new();
        config.watch.debounce_ms = 0;
        config
    }

    pub fn engine(&self) -> Engine {
        Engine::open(self.config_for(&self.repo_root), Vec::new()).expect("Failed to open engine")
    }

    /// Write `source/<dir>/SKILL.md`.
    pub fn write_source(&self, dir: &str, content: &str) -> PathBuf {
        let path = self.source_dir.join(dir).join("SKILL.md");
        std::fs::create_dir_all(path.parent().expect("manifest has a parent")).expect("Failed to create skill dir");
        std::fs::write(&path, content).expect("Failed to write manifest");
        path
    }

    /// Write a source skill whose front matter carries `name`.
    pub fn write_named_source(&self, name: &str) -> PathBuf {
        self.write_source(name, &format!("---\nname: {name}\ndescription: {name} helper\n---\n\n# {name}\n"))
    }

    /// Scan and import the candidate with display name `name`.
    pub fn import_named(&self, engine: &mut Engine, name: &str) -> ImportOutcome {
        let result = engine.scan().expect("scan failed");
        let candidate = result
            .candidates()
            .find(|c| c.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no candidate named {name}"));
        engine.import(&candidate).expect("import failed")
    }

    pub fn stored_dirs(&self) -> Vec<String> {
        dir_names(&self.repo_root.join("skills"))
    }
}

/// Sorted entry names of `dir`, or empty when it does not exist.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

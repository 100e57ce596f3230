use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::Config;

/// Isolated filesystem for one test.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {}", data_path.display());

        Self { temp_dir, data_path }
    }

    /// Create a test file with content.
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write `<dir>/<name>/SKILL.md` with a front matter name and description.
    pub fn create_skill(&self, dir: &str, name: &str, description: &str) -> PathBuf {
        let manifest = self.create_file(
            &format!("{dir}/{name}/SKILL.md"),
            &format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        );
        manifest
            .parent()
            .map_or_else(|| self.data_path.clone(), Path::to_path_buf)
    }

    /// Settings rooted inside the fixture, with no scan roots and no
    /// debounce delay.
    #[must_use]
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.root = self.data_path.join("repo").display().to_string();
        config.storage.legacy_root = None;
        config.scan.global = Vec::new();
        config.scan.workspace = Vec::new();
        config.watch.debounce_ms = 0;
        config
    }
}

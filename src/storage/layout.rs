//! On-disk layout of a storage root and migration away from older layouts.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::{hash, manifest};
use crate::error::Result;
use crate::storage::document::RepositoryDocument;
use crate::utils::fs::{copy_dir_all, ensure_dir, remove_dir_if_exists};

pub const DOCUMENT_FILE: &str = "config.json";
pub const SKILLS_DIR: &str = "skills";
pub const STAGING_DIR: &str = ".staging";

/// Paths inside one storage root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    manifest_file: String,
}

/// A directory under `skills/` that holds a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillDir {
    /// Digest recomputed from the manifest bytes.
    pub digest: String,
    pub path: PathBuf,
}

impl SkillDir {
    #[must_use]
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, manifest_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            manifest_file: manifest_file.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.root.join(DOCUMENT_FILE)
    }

    #[must_use]
    pub fn skills_dir(&self) -> PathBuf {
        self.root.join(SKILLS_DIR)
    }

    #[must_use]
    pub fn skill_dir(&self, digest: &str) -> PathBuf {
        self.skills_dir().join(digest)
    }

    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    #[must_use]
    pub fn manifest_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.manifest_file)
    }

    /// Enumerate skill directories, recomputing each digest.
    ///
    /// When two directories hash the same, the one already named by its
    /// digest wins.
    pub fn skill_dirs(&self) -> Result<Vec<SkillDir>> {
        let mut found: Vec<SkillDir> = Vec::new();
        for dir in self.raw_skill_dirs()? {
            match found.iter_mut().find(|existing| existing.digest == dir.digest) {
                Some(existing) if dir.dir_name() == dir.digest => *existing = dir,
                Some(_) => debug!("duplicate content in {}", dir.path.display()),
                None => found.push(dir),
            }
        }
        Ok(found)
    }

    /// Every directory under `skills/` with a readable manifest, sorted by
    /// path. Unreadable manifests are skipped.
    fn raw_skill_dirs(&self) -> Result<Vec<SkillDir>> {
        let entries = match std::fs::read_dir(self.skills_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let manifest_path = self.manifest_in(&path);
            if !manifest_path.is_file() {
                continue;
            }
            match hash::digest_file(&manifest_path) {
                Ok(digest) => dirs.push(SkillDir { digest, path }),
                Err(err) => {
                    warn!("skipping unreadable manifest {}: {err}", manifest_path.display());
                }
            }
        }
        dirs.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(dirs)
    }
}

/// Copy a legacy root's skills and document into `layout` when it has none.
///
/// Returns true when anything was copied.
pub fn adopt_legacy_root(layout: &Layout, legacy_root: &Path) -> Result<bool> {
    if layout.document_path().exists() || legacy_root == layout.root() {
        return Ok(false);
    }
    let legacy = Layout::new(legacy_root, layout.manifest_file());
    let legacy_doc = legacy.document_path();
    if !legacy_doc.is_file() {
        return Ok(false);
    }

    info!(
        "migrating storage from legacy root {} to {}",
        legacy_root.display(),
        layout.root().display()
    );
    ensure_dir(layout.root())?;
    if legacy.skills_dir().is_dir() {
        copy_dir_all(&legacy.skills_dir(), &layout.skills_dir())?;
    }
    std::fs::copy(&legacy_doc, layout.document_path())?;
    Ok(true)
}

/// Move name-keyed skill directories to `skills/<digest>`.
///
/// The old directory name becomes `customName` when the manifest carries no
/// name of its own, and metadata stored under the old name follows the skill.
/// Returns true when the document changed.
pub fn migrate_name_keyed(layout: &Layout, doc: &mut RepositoryDocument) -> Result<bool> {
    let mut changed = false;
    for dir in layout.raw_skill_dirs()? {
        let old_name = dir.dir_name();
        if hash::is_digest(&old_name) {
            continue;
        }

        let target = layout.skill_dir(&dir.digest);
        if target.exists() {
            info!("dropping legacy copy {} (already stored)", dir.path.display());
            remove_dir_if_exists(&dir.path)?;
        } else {
            info!("moving legacy skill {} to {}", old_name, dir.digest);
            std::fs::rename(&dir.path, &target)?;
        }

        if let Some(meta) = doc.skills.remove(&old_name) {
            doc.skills.entry(dir.digest.clone()).or_insert(meta);
        }
        let has_own_name = manifest::parse_file(&layout.manifest_in(&target))
            .name
            .is_some();
        let meta = doc.skills.entry(dir.digest.clone()).or_default();
        if !has_own_name && meta.custom_name.is_none() {
            meta.custom_name = Some(old_name.clone());
        }
        for preset in &mut doc.presets {
            for id in &mut preset.skill_ids {
                if *id == old_name {
                    id.clone_from(&dir.digest);
                }
            }
            preset.dedup_skill_ids();
        }
        changed = true;
    }
    Ok(changed)
}

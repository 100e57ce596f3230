use std::path::Path;

use tracing::{error, info, warn};

use crate::core::{Skill, manifest};
use crate::error::Result;
use crate::storage::document::{RepositoryDocument, migrate_document};
use crate::storage::layout::{self, Layout, SkillDir};
use crate::utils::fs::{ensure_dir, remove_dir_if_exists, write_atomic};

/// The repository document of one storage root, held in memory.
///
/// Mutations go through [`ConfigStore::document_mut`] followed by
/// [`ConfigStore::persist`], which rewrites the whole document.
#[derive(Debug)]
pub struct ConfigStore {
    layout: Layout,
    doc: RepositoryDocument,
}

impl ConfigStore {
    /// Open a storage root, migrating older layouts and repairing the document.
    pub fn open(root: &Path, legacy_root: Option<&Path>, manifest_file: &str) -> Result<Self> {
        let layout = Layout::new(root, manifest_file);
        ensure_dir(layout.skills_dir())?;
        // Leftovers from an interrupted import.
        remove_dir_if_exists(&layout.staging_dir())?;

        if let Some(legacy) = legacy_root {
            layout::adopt_legacy_root(&layout, legacy)?;
        }

        let (doc, mut dirty) = load_document(&layout.document_path())?;
        let mut store = Self { layout, doc };

        dirty |= layout::migrate_name_keyed(&store.layout, &mut store.doc)?;
        if dirty {
            store.persist()?;
        }
        Ok(store)
    }

    /// Re-read the document from disk, discarding in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        let (doc, dirty) = load_document(&self.layout.document_path())?;
        self.doc = doc;
        if dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// Serialize the document and atomically replace `config.json`.
    pub fn persist(&self) -> Result<()> {
        let rendered = serde_json::to_string_pretty(&self.doc)?;
        write_atomic(&self.layout.document_path(), rendered.as_bytes())
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    #[must_use]
    pub const fn document(&self) -> &RepositoryDocument {
        &self.doc
    }

    pub const fn document_mut(&mut self) -> &mut RepositoryDocument {
        &mut self.doc
    }

    /// Build the caller-facing view of one skill directory.
    #[must_use]
    pub fn describe(&self, dir: &SkillDir) -> Skill {
        let info = manifest::parse_file(&self.layout.manifest_in(&dir.path));
        let meta = self.doc.skills.get(&dir.digest);

        let name = info
            .name
            .or_else(|| meta.and_then(|m| m.custom_name.clone()))
            .unwrap_or_else(|| dir.dir_name());
        let description = info
            .description
            .or_else(|| meta.and_then(|m| m.custom_description.clone()));

        Skill {
            id: dir.digest.clone(),
            name,
            description,
            tags: meta.map(|m| m.tags.clone()).unwrap_or_default(),
            path: dir.path.clone(),
            source: meta.and_then(|m| m.source.clone()),
            imported_at: meta.and_then(|m| m.imported_at),
        }
    }

    /// All skills on disk, without reconciling the document first.
    pub fn skills(&self) -> Result<Vec<Skill>> {
        Ok(self
            .layout
            .skill_dirs()?
            .iter()
            .map(|dir| self.describe(dir))
            .collect())
    }
}

/// Returns the document and whether it must be written back.
fn load_document(path: &Path) -> Result<(RepositoryDocument, bool)> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("initialising repository document at {}", path.display());
            return Ok((RepositoryDocument::default(), true));
        }
        Err(err) => return Err(err.into()),
    };

    let value = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value,
        Err(err) => {
            error!(
                "repository document {} is corrupt ({err}); reinitialising with defaults",
                path.display()
            );
            return Ok((RepositoryDocument::default(), true));
        }
    };

    if !value.is_object() {
        error!(
            "repository document {} is not an object; reinitialising with defaults",
            path.display()
        );
    }
    let migrated = migrate_document(value);
    if migrated.repaired {
        warn!("repaired repository document {}", path.display());
    }
    Ok((migrated.document, migrated.repaired))
}

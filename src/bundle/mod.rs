//! Portable bundles: skills addressed by display name plus `presets.json`.
//!
//! A bundle is a directory tree, or a zip archive of one:
//!
//! ```text
//! skills/<display-name>/SKILL.md
//! skills/<display-name>/...assets
//! presets.json
//! ```
//!
//! Names are the join key across stores. Preset ids are carried along and
//! only trusted when importing back into a store that still has them.

mod archive;
pub mod export;
pub mod import;

use serde::{Deserialize, Serialize};

pub use export::{ExportReport, ExportSelection, export_bundle};
pub use import::{BundleImportOptions, BundleImportReport, import_bundle};

/// Name of the presets manifest at the bundle root.
pub const PRESETS_FILE: &str = "presets.json";

/// Directory holding one subdirectory per skill.
pub const BUNDLE_SKILLS_DIR: &str = "skills";

/// `presets.json` format version written by this crate.
pub const BUNDLE_VERSION: u32 = 2;

/// Contents of `presets.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetsFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub presets: Vec<BundlePreset>,
    /// Per-skill metadata; older bundles omit it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<BundleSkill>,
}

impl Default for PresetsFile {
    fn default() -> Self {
        Self {
            version: BUNDLE_VERSION,
            presets: Vec::new(),
            skills: Vec::new(),
        }
    }
}

const fn default_version() -> u32 {
    BUNDLE_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlePreset {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
    #[serde(default)]
    pub skill_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSkill {
    pub name: String,
    /// Directory under `skills/` when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BundleSkill {
    #[must_use]
    pub fn dir_name(&self) -> &str {
        self.dir.as_deref().unwrap_or(&self.name)
    }
}

/// True when `path` should be treated as a zip archive.
#[must_use]
pub fn is_zip_path(path: &std::path::Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

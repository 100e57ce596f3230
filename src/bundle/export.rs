//! Writing bundles.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bundle::{BUNDLE_SKILLS_DIR, BundlePreset, BundleSkill, PRESETS_FILE, PresetsFile, archive, is_zip_path};
use crate::core::Skill;
use crate::error::{RepoError, Result};
use crate::storage::{Preset, RepositoryDocument};
use crate::utils::fs::{claim_dir_name, copy_dir_all, ensure_dir, remove_dir_if_exists, write_atomic};

/// Which skills and presets go into a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    /// Every skill and every preset.
    All,
    /// These skills; no presets.
    Skills(Vec<String>),
    /// These presets and the union of their members.
    Presets(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub destination: PathBuf,
    pub archive: bool,
    pub skills: usize,
    pub presets: usize,
    pub files: u64,
}

/// Write a bundle to `dest`. A `.zip` destination produces an archive,
/// anything else a directory tree.
pub fn export_bundle(
    doc: &RepositoryDocument,
    skills: &[Skill],
    selection: &ExportSelection,
    dest: &Path,
) -> Result<ExportReport> {
    let (chosen, presets) = select(doc, skills, selection)?;
    if chosen.is_empty() {
        return Err(RepoError::InvalidInput("nothing to export".into()));
    }

    let archive = is_zip_path(dest);
    let scratch;
    let tree_root = if archive {
        scratch = tempfile::TempDir::new()?;
        scratch.path().to_path_buf()
    } else {
        dest.to_path_buf()
    };

    let mut files = write_tree(&tree_root, &chosen, &presets)?;
    if archive {
        files = archive::write_zip(&tree_root, dest)?;
    }

    info!(
        "exported {} skill(s) and {} preset(s) to {}",
        chosen.len(),
        presets.len(),
        dest.display()
    );
    Ok(ExportReport {
        destination: dest.to_path_buf(),
        archive,
        skills: chosen.len(),
        presets: presets.len(),
        files,
    })
}

fn select<'a>(
    doc: &'a RepositoryDocument,
    skills: &'a [Skill],
    selection: &ExportSelection,
) -> Result<(Vec<&'a Skill>, Vec<&'a Preset>)> {
    let by_id: HashMap<&str, &Skill> = skills.iter().map(|s| (s.id.as_str(), s)).collect();

    match selection {
        ExportSelection::All => Ok((skills.iter().collect(), doc.presets.iter().collect())),
        ExportSelection::Skills(ids) => {
            let mut seen = HashSet::new();
            let mut chosen = Vec::new();
            for id in ids {
                let skill = by_id
                    .get(id.as_str())
                    .ok_or_else(|| RepoError::SkillNotFound(id.clone()))?;
                if seen.insert(id.as_str()) {
                    chosen.push(*skill);
                }
            }
            Ok((chosen, Vec::new()))
        }
        ExportSelection::Presets(ids) => {
            let mut presets = Vec::new();
            for id in ids {
                let preset = doc
                    .preset(id)
                    .ok_or_else(|| RepoError::PresetNotFound(id.clone()))?;
                if !presets.iter().any(|p: &&Preset| p.id == preset.id) {
                    presets.push(preset);
                }
            }
            let mut seen = HashSet::new();
            let chosen = presets
                .iter()
                .flat_map(|p| p.skill_ids.iter())
                .filter_map(|id| by_id.get(id.as_str()).copied())
                .filter(|s| seen.insert(s.id.as_str()))
                .collect();
            Ok((chosen, presets))
        }
    }
}

fn write_tree(root: &Path, skills: &[&Skill], presets: &[&Preset]) -> Result<u64> {
    // A reused destination must hold only this export's skills.
    let skills_dir = root.join(BUNDLE_SKILLS_DIR);
    remove_dir_if_exists(&skills_dir)?;
    ensure_dir(&skills_dir)?;

    let mut taken = HashSet::new();
    let mut names_by_id = HashMap::new();
    let mut entries = Vec::with_capacity(skills.len());
    let mut files = 0;
    for skill in skills {
        let dir = claim_dir_name(&mut taken, &skill.name);
        let dest = skills_dir.join(&dir);
        files += copy_dir_all(&skill.path, &dest)?;

        names_by_id.insert(skill.id.as_str(), skill.name.as_str());
        entries.push(BundleSkill {
            dir: (dir != skill.name).then_some(dir),
            name: skill.name.clone(),
            tags: skill.tags.clone(),
            description: skill.description.clone(),
        });
    }

    let presets = presets
        .iter()
        .map(|preset| {
            let skill_ids: Vec<String> = preset
                .skill_ids
                .iter()
                .filter(|id| names_by_id.contains_key(id.as_str()))
                .cloned()
                .collect();
            let skill_names = skill_ids
                .iter()
                .filter_map(|id| names_by_id.get(id.as_str()))
                .map(ToString::to_string)
                .collect();
            BundlePreset {
                id: preset.id.clone(),
                name: preset.name.clone(),
                description: preset.description.clone(),
                skill_ids,
                skill_names,
            }
        })
        .collect();

    let manifest = PresetsFile {
        presets,
        skills: entries,
        ..PresetsFile::default()
    };
    write_atomic(
        &root.join(PRESETS_FILE),
        serde_json::to_string_pretty(&manifest)?.as_bytes(),
    )?;
    Ok(files + 1)
}

//! Preset registry: named skill sets and applying them to a directory.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::Skill;
use crate::error::{ConflictKind, RepoError, Result};
use crate::storage::{Preset, RepositoryDocument};
use crate::utils::fs::{claim_dir_name, clear_dir, copy_dir_all, ensure_dir, remove_dir_if_exists};

/// How [`apply`] treats what is already in the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// Keep unrelated entries; same-named directories are replaced.
    #[default]
    Merge,
    /// Empty the target first.
    Replace,
}

/// Caller input for [`save`]. An absent or blank id creates a new preset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    /// Directory names written into the target.
    pub copied: Vec<String>,
    /// Member ids that no longer resolve.
    pub missing: Vec<String>,
}

/// Create or update a preset.
///
/// Name uniqueness is case-insensitive and checked against every other
/// preset. With `allow_overwrite` the clashing preset is removed instead of
/// failing. Member ids that are not imported skills are dropped.
pub fn save(
    doc: &mut RepositoryDocument,
    draft: PresetDraft,
    allow_overwrite: bool,
    skills: &[Skill],
) -> Result<Preset> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(RepoError::InvalidInput("preset name must not be empty".into()));
    }

    let id = draft
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let is_new = id.as_deref().map_or(true, |id| doc.preset(id).is_none());
    if is_new && skills.is_empty() {
        return Err(RepoError::InvalidInput(
            "cannot create a preset before any skill is imported".into(),
        ));
    }
    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Some(clash) = doc
        .presets
        .iter()
        .find(|p| p.id != id && p.name_matches(name))
    {
        if !allow_overwrite {
            return Err(RepoError::Conflict {
                kind: ConflictKind::Preset,
                name: clash.name.clone(),
                existing_id: clash.id.clone(),
            });
        }
        let replaced = clash.id.clone();
        info!("replacing preset '{}' ({replaced})", clash.name);
        doc.presets.retain(|p| p.id != replaced);
    }

    let valid: HashSet<&str> = skills.iter().map(|s| s.id.as_str()).collect();
    let (kept, dropped): (Vec<String>, Vec<String>) = draft
        .skill_ids
        .into_iter()
        .partition(|sid| valid.contains(sid.as_str()));
    if !dropped.is_empty() {
        warn!("preset '{name}': ignoring {} unknown skill id(s)", dropped.len());
    }

    let mut preset = Preset {
        id: id.clone(),
        name: name.to_string(),
        description: draft
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        skill_ids: kept,
    };
    preset.dedup_skill_ids();

    match doc.preset_mut(&id) {
        Some(existing) => *existing = preset.clone(),
        None => doc.presets.push(preset.clone()),
    }
    debug!("saved preset '{}' with {} skill(s)", preset.name, preset.skill_ids.len());
    Ok(preset)
}

/// Remove a preset, returning it.
pub fn delete(doc: &mut RepositoryDocument, id: &str) -> Result<Preset> {
    let index = doc
        .presets
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| RepoError::PresetNotFound(id.to_string()))?;
    Ok(doc.presets.remove(index))
}

/// Copy the preset's skills into `target`, one directory per display name.
pub fn apply(preset: &Preset, skills: &[Skill], mode: ApplyMode, target: &Path) -> Result<ApplyReport> {
    let by_id: HashMap<&str, &Skill> = skills.iter().map(|s| (s.id.as_str(), s)).collect();

    match mode {
        ApplyMode::Replace => clear_dir(target)?,
        ApplyMode::Merge => ensure_dir(target)?,
    }

    let mut report = ApplyReport::default();
    let mut taken = HashSet::new();
    for id in &preset.skill_ids {
        let Some(skill) = by_id.get(id.as_str()) else {
            debug!("preset '{}': skill {id} no longer exists", preset.name);
            report.missing.push(id.clone());
            continue;
        };
        let dir_name = claim_dir_name(&mut taken, &skill.name);
        let dest = target.join(&dir_name);
        remove_dir_if_exists(&dest)?;
        copy_dir_all(&skill.path, &dest)?;
        report.copied.push(dir_name);
    }

    info!(
        "applied preset '{}' to {} ({} copied, {} missing)",
        preset.name,
        target.display(),
        report.copied.len(),
        report.missing.len()
    );
    Ok(report)
}

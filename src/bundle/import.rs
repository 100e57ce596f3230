//! Reading bundles into a store.
//!
//! Skills are matched to the store by display name, not digest. Within one
//! bundle the first directory carrying a name wins. Content that is already
//! stored, under any name, is skipped and its bundle name still resolves for
//! presets. Presets are resolved after all skills have landed.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bundle::{BUNDLE_SKILLS_DIR, BUNDLE_VERSION, BundlePreset, PRESETS_FILE, PresetsFile, archive, is_zip_path};
use crate::core::{DiscoveredCandidate, SourceKind};
use crate::dedup::name_key;
use crate::error::{RepoError, Result};
use crate::import::import_candidate;
use crate::scan::ScanOptions;
use crate::scan::local::{candidate_from_dir, find_skill_dirs};
use crate::storage::{ConfigStore, Preset, normalize_tags};
use crate::utils::fs::read_optional;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleImportOptions {
    /// Replace same-named skills and presets instead of skipping them.
    pub overwrite: bool,
    /// Trust carried preset skill ids when every one is valid here.
    pub as_is: bool,
}

/// Counters for a bundle import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleImportReport {
    pub skills_imported: usize,
    pub skills_overwritten: usize,
    pub skills_skipped: usize,
    pub presets_imported: usize,
    pub presets_overwritten: usize,
    pub presets_skipped: usize,
}

/// Import a bundle directory or `.zip` archive.
pub fn import_bundle(
    store: &mut ConfigStore,
    source: &Path,
    options: BundleImportOptions,
    scan: &ScanOptions,
) -> Result<BundleImportReport> {
    if !source.exists() {
        return Err(RepoError::InvalidInput(format!(
            "bundle {} does not exist",
            source.display()
        )));
    }

    let extracted;
    let root = if source.is_file() {
        if !is_zip_path(source) {
            warn!("{} has no .zip extension; reading it as an archive", source.display());
        }
        extracted = tempfile::TempDir::new()?;
        archive::extract_zip(source, extracted.path())?;
        extracted.path().to_path_buf()
    } else {
        source.to_path_buf()
    };

    let manifest = read_presets_file(&root)?;
    let label = source.display().to_string();
    let candidates = discover(&root, manifest.as_ref(), scan, &label)?;

    let mut report = BundleImportReport::default();
    let mut aliases = HashMap::new();
    for candidate in &candidates {
        import_one(store, candidate, manifest.as_ref(), options, &mut aliases, &mut report)?;
    }

    if let Some(manifest) = &manifest {
        let skills = store.skills()?;
        let mut by_name: HashMap<String, String> = skills
            .iter()
            .map(|s| (name_key(&s.name), s.id.clone()))
            .collect();
        for (key, id) in aliases {
            by_name.entry(key).or_insert(id);
        }
        let valid: HashSet<&str> = skills.iter().map(|s| s.id.as_str()).collect();
        for entry in &manifest.presets {
            import_preset(store, entry, &by_name, &valid, options, &mut report);
        }
    }

    store.persist()?;
    info!(
        "bundle {label}: skills {}/{}/{} presets {}/{}/{} (imported/overwritten/skipped)",
        report.skills_imported,
        report.skills_overwritten,
        report.skills_skipped,
        report.presets_imported,
        report.presets_overwritten,
        report.presets_skipped
    );
    Ok(report)
}

fn read_presets_file(root: &Path) -> Result<Option<PresetsFile>> {
    let Some(raw) = read_optional(root.join(PRESETS_FILE))? else {
        return Ok(None);
    };
    match serde_json::from_str::<PresetsFile>(&raw) {
        Ok(file) => {
            if file.version > BUNDLE_VERSION {
                warn!("{PRESETS_FILE} version {} is newer than {BUNDLE_VERSION}", file.version);
            }
            Ok(Some(file))
        }
        Err(err) => {
            warn!("ignoring unreadable {PRESETS_FILE}: {err}");
            Ok(None)
        }
    }
}

/// Walk the bundle and dedup by name, first occurrence wins.
fn discover(
    root: &Path,
    manifest: Option<&PresetsFile>,
    scan: &ScanOptions,
    label: &str,
) -> Result<Vec<DiscoveredCandidate>> {
    let skills_root = root.join(BUNDLE_SKILLS_DIR);
    let names_by_dir: HashMap<&str, &str> = manifest
        .iter()
        .flat_map(|m| m.skills.iter())
        .map(|s| (s.dir_name(), s.name.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for dir in find_skill_dirs(root, scan)? {
        let mut candidate = match candidate_from_dir(&dir, &scan.manifest_file, SourceKind::Bundle, label) {
            Ok(candidate) => candidate,
            Err(err) => {
                warn!("skipping {}: {err}", dir.display());
                continue;
            }
        };
        // Exported directory names may be sanitised or suffixed.
        if dir.parent() == Some(skills_root.as_path()) {
            let dir_name = crate::scan::local::dir_name(&dir);
            if let Some(name) = names_by_dir.get(dir_name.as_str()) {
                if crate::core::manifest::parse_file(&dir.join(&scan.manifest_file))
                    .name
                    .is_none()
                {
                    candidate.name = (*name).to_string();
                }
            }
        }
        if seen.insert(name_key(&candidate.name)) {
            out.push(candidate);
        } else {
            debug!("bundle already has a skill named '{}'; skipping {}", candidate.name, dir.display());
        }
    }
    Ok(out)
}

fn import_one(
    store: &mut ConfigStore,
    candidate: &DiscoveredCandidate,
    manifest: Option<&PresetsFile>,
    options: BundleImportOptions,
    aliases: &mut HashMap<String, String>,
    report: &mut BundleImportReport,
) -> Result<()> {
    let key = name_key(&candidate.name);
    let skills = store.skills()?;

    if let Some(stored) = skills.iter().find(|s| s.id == candidate.digest) {
        debug!("'{}' is already present as '{}'", candidate.name, stored.name);
        aliases.insert(key, stored.id.clone());
        report.skills_skipped += 1;
        return Ok(());
    }

    let existing = skills.into_iter().find(|s| name_key(&s.name) == key);
    let overwrite = match &existing {
        None => false,
        Some(_) if !options.overwrite => {
            info!("skipping '{}': a different skill has that name", candidate.name);
            report.skills_skipped += 1;
            return Ok(());
        }
        Some(_) => true,
    };

    let outcome = import_candidate(store, candidate, None)?;
    if overwrite {
        report.skills_overwritten += 1;
    } else {
        report.skills_imported += 1;
    }

    let carried = manifest
        .iter()
        .flat_map(|m| m.skills.iter())
        .find(|s| name_key(&s.name) == key);
    if let Some(carried) = carried {
        let meta = store.document_mut().skills.entry(outcome.id).or_default();
        meta.tags = normalize_tags(meta.tags.iter().chain(carried.tags.iter()));
    }
    Ok(())
}

fn import_preset(
    store: &mut ConfigStore,
    entry: &BundlePreset,
    by_name: &HashMap<String, String>,
    valid: &HashSet<&str>,
    options: BundleImportOptions,
    report: &mut BundleImportReport,
) {
    let name = entry.name.trim();
    if name.is_empty() {
        report.presets_skipped += 1;
        return;
    }

    let carried_ids_valid =
        !entry.skill_ids.is_empty() && entry.skill_ids.iter().all(|id| valid.contains(id.as_str()));
    let skill_ids: Vec<String> = if options.as_is && carried_ids_valid {
        entry.skill_ids.clone()
    } else {
        entry
            .skill_names
            .iter()
            .filter_map(|n| by_name.get(&name_key(n)).cloned())
            .collect()
    };

    let mut preset = Preset {
        id: entry.id.trim().to_string(),
        name: name.to_string(),
        description: entry.description.clone(),
        skill_ids,
    };
    preset.dedup_skill_ids();
    if preset.skill_ids.is_empty() {
        debug!("preset '{name}' has no resolvable skills; dropped");
        report.presets_skipped += 1;
        return;
    }

    let doc = store.document_mut();
    let conflicts =
        |p: &Preset| (!preset.id.is_empty() && p.id == preset.id) || p.name_matches(name);
    if doc.presets.iter().any(conflicts) {
        if !options.overwrite {
            report.presets_skipped += 1;
            return;
        }
        doc.presets.retain(|p| !conflicts(p));
        report.presets_overwritten += 1;
    } else {
        report.presets_imported += 1;
    }
    if preset.id.is_empty() {
        preset.id = uuid::Uuid::new_v4().to_string();
    }
    doc.presets.push(preset);
}

//! Self-healing of the repository document against the filesystem.
//!
//! The skill directories on disk are ground truth. Metadata keyed by a digest
//! with no directory is dropped, and presets lose members that no longer
//! exist. A pass that changes nothing does not write.

mod debounce;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::hash;
use crate::error::Result;
use crate::storage::{ConfigStore, RepositoryDocument};

pub use debounce::ChangeDebouncer;

/// What a reconciliation pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Metadata keys with no skill directory.
    pub pruned_skills: Vec<String>,
    /// Preset members removed, summed over presets.
    pub pruned_preset_refs: usize,
    pub persisted: bool,
}

impl ReconcileReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.pruned_skills.is_empty() || self.pruned_preset_refs > 0
    }
}

/// Drop every reference not in `valid`. Pure; no I/O.
pub fn reconcile_document(doc: &mut RepositoryDocument, valid: &HashSet<String>) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let stale: Vec<String> = doc
        .skills
        .keys()
        .filter(|id| !valid.contains(*id))
        .cloned()
        .collect();
    for id in &stale {
        doc.skills.remove(id);
    }
    report.pruned_skills = stale;

    for preset in &mut doc.presets {
        let before = preset.skill_ids.len();
        preset.skill_ids.retain(|id| valid.contains(id));
        report.pruned_preset_refs += before - preset.skill_ids.len();
    }
    report
}

/// Reconcile the store's document with its skill directories, persisting
/// once if anything changed.
pub fn reconcile(store: &mut ConfigStore) -> Result<ReconcileReport> {
    let valid: HashSet<String> = store
        .layout()
        .skill_dirs()?
        .into_iter()
        .map(|dir| dir.digest)
        .collect();

    let mut report = reconcile_document(store.document_mut(), &valid);
    if report.changed() {
        store.persist()?;
        report.persisted = true;
        info!(
            "reconciled: pruned {} metadata entr{} and {} preset reference(s)",
            report.pruned_skills.len(),
            if report.pruned_skills.len() == 1 { "y" } else { "ies" },
            report.pruned_preset_refs
        );
        for id in &report.pruned_skills {
            tracing::debug!("pruned {}", hash::short(id));
        }
    }
    Ok(report)
}

//! Candidate classification against the imported store.
//!
//! ## Strategy
//!
//! 1. **Digest match**: a candidate whose digest is already stored is
//!    "already imported".
//! 2. **Name collision**: a remaining candidate whose name matches an imported
//!    skill case-insensitively, with different content, is flagged. The flag
//!    is advisory; importing it requires an explicit overwrite.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::{DiscoveredCandidate, Skill};

/// An imported skill a candidate collides with by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameConflict {
    pub existing_id: String,
    pub existing_name: String,
}

/// A not-yet-imported candidate with its collision flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discoverable {
    #[serde(flatten)]
    pub candidate: DiscoveredCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<NameConflict>,
}

/// Partition of a scan against the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub discoverable: Vec<Discoverable>,
    /// Candidates whose digest is already stored.
    pub already_imported: Vec<DiscoveredCandidate>,
}

impl Classification {
    #[must_use]
    pub fn conflicts(&self) -> usize {
        self.discoverable.iter().filter(|d| d.conflict.is_some()).count()
    }
}

/// Lower-cased name key used for case-insensitive matching.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Classify `candidates` against `imported`.
///
/// Candidates are merged by digest first (first occurrence wins), so the
/// output never lists the same content twice.
#[must_use]
pub fn classify(candidates: &[DiscoveredCandidate], imported: &[Skill]) -> Classification {
    let stored: HashSet<&str> = imported.iter().map(|s| s.id.as_str()).collect();
    let mut by_name: HashMap<String, &Skill> = HashMap::new();
    for skill in imported {
        by_name.entry(name_key(&skill.name)).or_insert(skill);
    }

    let mut seen = HashSet::new();
    let mut out = Classification::default();
    for candidate in candidates {
        if !seen.insert(candidate.digest.as_str()) {
            continue;
        }
        if stored.contains(candidate.digest.as_str()) {
            out.already_imported.push(candidate.clone());
            continue;
        }
        let conflict = by_name
            .get(&name_key(&candidate.name))
            .map(|existing| NameConflict {
                existing_id: existing.id.clone(),
                existing_name: existing.name.clone(),
            });
        out.discoverable.push(Discoverable {
            candidate: candidate.clone(),
            conflict,
        });
    }
    out
}

/// Imported skill a candidate would overwrite: same name, different content.
#[must_use]
pub fn conflicting_skill<'a>(candidate: &DiscoveredCandidate, imported: &'a [Skill]) -> Option<&'a Skill> {
    let key = name_key(&candidate.name);
    imported
        .iter()
        .find(|s| name_key(&s.name) == key && s.id != candidate.digest)
}

//! The persisted repository document (`config.json`).
//!
//! Loading goes through [`migrate_document`], which accepts any older or
//! partial shape and produces the current schema. Unknown fields are dropped.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current `schemaVersion`.
pub const SCHEMA_VERSION: u32 = 2;

/// Per-skill metadata, keyed by digest in [`RepositoryDocument::skills`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
}

/// A named set of skill ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
}

impl Preset {
    /// Collapse duplicate members, keeping first-seen order.
    pub fn dedup_skill_ids(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.skill_ids.retain(|id| seen.insert(id.clone()));
    }

    #[must_use]
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillMetadata>,
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub default_export_path: String,
}

impl Default for RepositoryDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            skills: BTreeMap::new(),
            presets: Vec::new(),
            default_export_path: String::new(),
        }
    }
}

impl RepositoryDocument {
    #[must_use]
    pub fn preset(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn preset_mut(&mut self, id: &str) -> Option<&mut Preset> {
        self.presets.iter_mut().find(|p| p.id == id)
    }

    /// Move metadata and preset membership from `old` to `new`.
    ///
    /// Existing metadata under `new` wins; the `old` entry is discarded rather
    /// than merged.
    pub fn migrate_identity(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(meta) = self.skills.remove(old) {
            self.skills.entry(new.to_string()).or_insert(meta);
        }
        for preset in &mut self.presets {
            let mut touched = false;
            for id in &mut preset.skill_ids {
                if id == old {
                    new.clone_into(id);
                    touched = true;
                }
            }
            if touched {
                preset.dedup_skill_ids();
            }
        }
    }

    /// Drop a skill id from metadata and every preset.
    pub fn forget_skill(&mut self, id: &str) -> bool {
        let mut changed = self.skills.remove(id).is_some();
        for preset in &mut self.presets {
            let before = preset.skill_ids.len();
            preset.skill_ids.retain(|member| member != id);
            changed |= preset.skill_ids.len() != before;
        }
        changed
    }
}

/// Result of [`migrate_document`].
#[derive(Debug, Clone)]
pub struct Migrated {
    pub document: RepositoryDocument,
    /// The input differed from the canonical serialization of `document`.
    pub repaired: bool,
}

/// Bring any document shape up to the current schema.
///
/// Non-object input yields a default document. Individual broken fields are
/// defaulted; the rest of the document is kept.
#[must_use]
pub fn migrate_document(raw: Value) -> Migrated {
    let Value::Object(obj) = &raw else {
        return Migrated {
            document: RepositoryDocument::default(),
            repaired: true,
        };
    };

    let document = RepositoryDocument {
        schema_version: SCHEMA_VERSION,
        skills: read_skills(obj.get("skills")),
        presets: read_presets(obj.get("presets")),
        default_export_path: obj
            .get("defaultExportPath")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };

    let repaired = serde_json::to_value(&document).map_or(true, |canonical| canonical != raw);
    Migrated { document, repaired }
}

fn read_skills(value: Option<&Value>) -> BTreeMap<String, SkillMetadata> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, entry)| (key.clone(), read_metadata(entry)))
        .collect()
}

fn read_metadata(value: &Value) -> SkillMetadata {
    let Value::Object(obj) = value else {
        return SkillMetadata::default();
    };
    SkillMetadata {
        tags: normalize_tags(read_string_list(obj.get("tags"))),
        custom_name: non_empty(obj, "customName"),
        custom_description: non_empty(obj, "customDescription"),
        source: non_empty(obj, "source"),
        imported_at: obj
            .get("importedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

fn read_presets(value: Option<&Value>) -> Vec<Preset> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut seen_ids = std::collections::HashSet::new();
    let mut presets = Vec::new();
    for item in items {
        let Value::Object(obj) = item else {
            continue;
        };
        let Some(name) = non_empty(obj, "name") else {
            continue;
        };
        let id = non_empty(obj, "id")
            .filter(|id| !seen_ids.contains(id))
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        seen_ids.insert(id.clone());

        let members = obj.get("skillIds").or_else(|| obj.get("skills"));
        let mut preset = Preset {
            id,
            name,
            description: non_empty(obj, "description"),
            skill_ids: read_string_list(members),
        };
        preset.dedup_skill_ids();
        presets.push(preset);
    }
    presets
}

/// Accepts an array of strings or a single comma-joined string.
fn read_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Trim, drop empty and de-duplicate tags, keeping first-seen order.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_document_is_not_repaired() {
        let mut doc = RepositoryDocument::default();
        doc.skills.insert(
            "abc".into(),
            SkillMetadata {
                tags: vec!["rust".into()],
                ..SkillMetadata::default()
            },
        );
        let value = serde_json::to_value(&doc).unwrap();
        let migrated = migrate_document(value);
        assert!(!migrated.repaired);
        assert_eq!(migrated.document, doc);
    }

    #[test]
    fn non_object_resets_to_default() {
        let migrated = migrate_document(json!([1, 2, 3]));
        assert!(migrated.repaired);
        assert_eq!(migrated.document, RepositoryDocument::default());
    }

    #[test]
    fn legacy_shapes_are_upgraded() {
        let raw = json!({
            "skills": {
                "d1": { "tags": "a, b ,a", "customName": "  " },
                "d2": "garbage"
            },
            "presets": [
                { "name": "web", "skills": ["d1", "d1", "d2"] },
                { "id": "p2" },
                42
            ]
        });
        let migrated = migrate_document(raw);
        assert!(migrated.repaired);

        let doc = migrated.document;
        assert_eq!(doc.schema_version, SCHEMA_VERSION);
        assert_eq!(doc.skills["d1"].tags, vec!["a", "b"]);
        assert_eq!(doc.skills["d1"].custom_name, None);
        assert_eq!(doc.skills["d2"], SkillMetadata::default());
        assert_eq!(doc.presets.len(), 1);
        assert!(!doc.presets[0].id.is_empty());
        assert_eq!(doc.presets[0].skill_ids, vec!["d1", "d2"]);
        assert_eq!(doc.default_export_path, "");
    }

    #[test]
    fn duplicate_preset_ids_are_reassigned() {
        let raw = json!({
            "schemaVersion": 2,
            "skills": {},
            "presets": [
                { "id": "same", "name": "a", "skillIds": [] },
                { "id": "same", "name": "b", "skillIds": [] }
            ],
            "defaultExportPath": ""
        });
        let doc = migrate_document(raw).document;
        assert_eq!(doc.presets[0].id, "same");
        assert_ne!(doc.presets[1].id, "same");
    }

    #[test]
    fn migrate_identity_keeps_existing_new_entry() {
        let mut doc = RepositoryDocument::default();
        doc.skills.insert(
            "old".into(),
            SkillMetadata {
                tags: vec!["old-tag".into()],
                ..SkillMetadata::default()
            },
        );
        doc.skills.insert(
            "new".into(),
            SkillMetadata {
                tags: vec!["new-tag".into()],
                ..SkillMetadata::default()
            },
        );
        doc.presets.push(Preset {
            id: "p".into(),
            name: "p".into(),
            description: None,
            skill_ids: vec!["old".into(), "new".into()],
        });

        doc.migrate_identity("old", "new");

        assert!(!doc.skills.contains_key("old"));
        assert_eq!(doc.skills["new"].tags, vec!["new-tag"]);
        assert_eq!(doc.presets[0].skill_ids, vec!["new"]);
    }

    #[test]
    fn forget_skill_reports_change() {
        let mut doc = RepositoryDocument::default();
        doc.skills.insert("a".into(), SkillMetadata::default());
        assert!(doc.forget_skill("a"));
        assert!(!doc.forget_skill("a"));
    }

    #[test]
    fn normalize_tags_trims_and_dedups() {
        assert_eq!(normalize_tags([" x", "y", "", "x "]), vec!["x", "y"]);
    }
}

//! The repository handle.
//!
//! An [`Engine`] owns one storage root for its lifetime. Every mutation takes
//! the root's file lock, re-reads the document, applies the change and
//! persists it, so two processes pointed at the same root never interleave a
//! read-modify-write. Read operations reconcile first.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bundle::{self, BundleImportOptions, BundleImportReport, ExportReport, ExportSelection};
use crate::config::Config;
use crate::core::{DiscoveredCandidate, Skill, SourceKind, hash};
use crate::dedup::{self, Classification};
use crate::error::{ConflictKind, RepoError, Result};
use crate::import::{self, ImportOutcome};
use crate::preset::{self, ApplyMode, ApplyReport, PresetDraft};
use crate::reconcile::{self, ChangeDebouncer, ReconcileReport};
use crate::scan::github::{self, GitHubClient, RemoteScanOptions};
use crate::scan::{self, ScanOptions, ScanReport, SourceOutcome};
use crate::storage::lock::DEFAULT_LOCK_TIMEOUT;
use crate::storage::{ConfigStore, Preset, RepositoryDocument, RootLock, normalize_tags};
use crate::utils::fs::remove_dir_if_exists;

/// Shortest digest prefix accepted by [`Engine::resolve_skill_ref`].
pub const MIN_ID_PREFIX: usize = 6;

/// A scan classified against the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(flatten)]
    pub classification: Classification,
    pub sources: Vec<SourceOutcome>,
    pub truncated: bool,
}

impl ScanResult {
    fn new(report: ScanReport, imported: &[Skill]) -> Self {
        Self {
            classification: dedup::classify(&report.candidates, imported),
            sources: report.sources,
            truncated: report.truncated,
        }
    }

    /// Every candidate, discoverable first.
    pub fn candidates(&self) -> impl Iterator<Item = &DiscoveredCandidate> {
        self.classification
            .discoverable
            .iter()
            .map(|d| &d.candidate)
            .chain(self.classification.already_imported.iter())
    }
}

/// Partial metadata update. `Some("")` clears an override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataPatch {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct Engine {
    config: Config,
    workspaces: Vec<PathBuf>,
    store: ConfigStore,
    github: Option<GitHubClient>,
    debouncer: ChangeDebouncer,
    lock_timeout: Duration,
}

impl Engine {
    /// Open the storage root named by `config`, migrating older layouts.
    pub fn open(config: Config, workspaces: Vec<PathBuf>) -> Result<Self> {
        let root = config.root_path();
        let legacy = config.legacy_root_path();
        let store = {
            let _lock = RootLock::acquire_timeout(&root, DEFAULT_LOCK_TIMEOUT)?;
            ConfigStore::open(&root, legacy.as_deref(), &config.scan.manifest_file)?
        };
        let debouncer = ChangeDebouncer::new(
            store.layout().skills_dir(),
            config.scan.manifest_file.clone(),
            Duration::from_millis(config.watch.debounce_ms),
        );
        debug!("opened repository at {}", root.display());

        Ok(Self {
            config,
            workspaces,
            store,
            github: None,
            debouncer,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Use this client for remote operations instead of one built from config.
    #[must_use]
    pub fn with_github_client(mut self, client: GitHubClient) -> Self {
        self.github = Some(client);
        self
    }

    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Document as of the last operation.
    #[must_use]
    pub const fn document(&self) -> &RepositoryDocument {
        self.store.document()
    }

    // ---------------------------------------------------------------------
    // Read path
    // ---------------------------------------------------------------------

    pub fn list_skills(&mut self) -> Result<Vec<Skill>> {
        self.locked(|store| {
            reconcile::reconcile(store)?;
            store.skills()
        })
    }

    pub fn get_skill(&mut self, id: &str) -> Result<Skill> {
        self.list_skills()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| RepoError::SkillNotFound(id.to_string()))
    }

    /// Resolve a full digest, a unique digest prefix, or a display name.
    pub fn resolve_skill_ref(&mut self, reference: &str) -> Result<Skill> {
        let reference = reference.trim();
        let skills = self.list_skills()?;

        if let Some(skill) = skills.iter().find(|s| s.id == reference) {
            return Ok(skill.clone());
        }

        if reference.len() >= MIN_ID_PREFIX && reference.chars().all(|c| c.is_ascii_hexdigit()) {
            let lowered = reference.to_ascii_lowercase();
            let matches: Vec<&Skill> = skills.iter().filter(|s| s.id.starts_with(&lowered)).collect();
            match matches.as_slice() {
                [one] => return Ok((*one).clone()),
                [] => {}
                many => {
                    return Err(RepoError::InvalidInput(format!(
                        "'{reference}' matches {} skills; use a longer prefix",
                        many.len()
                    )));
                }
            }
        }

        let key = dedup::name_key(reference);
        let named: Vec<&Skill> = skills.iter().filter(|s| dedup::name_key(&s.name) == key).collect();
        match named.as_slice() {
            [one] => Ok((*one).clone()),
            [] => Err(RepoError::SkillNotFound(reference.to_string())),
            many => Err(RepoError::InvalidInput(format!(
                "{} skills are named '{reference}'; use an id",
                many.len()
            ))),
        }
    }

    pub fn list_presets(&mut self) -> Result<Vec<Preset>> {
        self.locked(|store| {
            reconcile::reconcile(store)?;
            Ok(store.document().presets.clone())
        })
    }

    // ---------------------------------------------------------------------
    // Scanning
    // ---------------------------------------------------------------------

    /// Scan global roots and every workspace's configured locations.
    pub fn scan(&mut self) -> Result<ScanResult> {
        let mut roots: Vec<(PathBuf, SourceKind)> = self
            .config
            .scan
            .global_roots()
            .into_iter()
            .map(|root| (root, SourceKind::Global))
            .collect();
        roots.extend(
            self.config
                .scan
                .workspace_roots(&self.workspaces)
                .into_iter()
                .map(|root| (root, SourceKind::Workspace)),
        );
        let report = scan::scan_local_roots(&roots, &self.scan_options());
        let imported = self.list_skills()?;
        Ok(ScanResult::new(report, &imported))
    }

    pub fn scan_custom_path(&mut self, path: &Path) -> Result<ScanResult> {
        let report = scan::scan_local_roots(&[(path.to_path_buf(), SourceKind::Custom)], &self.scan_options());
        let imported = self.list_skills()?;
        Ok(ScanResult::new(report, &imported))
    }

    /// Scan a GitHub repository. A malformed reference fails before any request.
    pub fn scan_remote(&mut self, reference: &str) -> Result<ScanResult> {
        github::parse_repo_ref(reference)?;
        let options = RemoteScanOptions {
            manifest_file: self.config.scan.manifest_file.clone(),
            max_candidates: self.config.remote.max_candidates,
            conventional_paths: self.config.remote.conventional_paths.clone(),
        };
        let report = github::scan_remote(self.github_client()?, reference, &options)?;
        let imported = self.list_skills()?;
        Ok(ScanResult::new(report, &imported))
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Import unconditionally, overwriting a same-named skill.
    pub fn import(&mut self, candidate: &DiscoveredCandidate) -> Result<ImportOutcome> {
        if candidate.is_remote() {
            self.github_client()?;
        }
        let github = self.github.as_ref();
        with_lock(&mut self.store, self.lock_timeout, |store| {
            import::import_candidate(store, candidate, github)
        })
    }

    /// Import, refusing to replace a same-named skill with different content
    /// unless `overwrite` is set.
    pub fn import_checked(&mut self, candidate: &DiscoveredCandidate, overwrite: bool) -> Result<ImportOutcome> {
        if !overwrite {
            let skills = self.list_skills()?;
            if let Some(existing) = dedup::conflicting_skill(candidate, &skills) {
                return Err(RepoError::Conflict {
                    kind: ConflictKind::Skill,
                    name: existing.name.clone(),
                    existing_id: existing.id.clone(),
                });
            }
        }
        self.import(candidate)
    }

    pub fn import_bundle(&mut self, path: &Path, overwrite: bool, as_is: bool) -> Result<BundleImportReport> {
        let scan = self.scan_options();
        self.locked(|store| {
            reconcile::reconcile(store)?;
            bundle::import_bundle(store, path, BundleImportOptions { overwrite, as_is }, &scan)
        })
    }

    /// Export to `dest`, or to the stored default export path.
    pub fn export_bundle(&mut self, selection: &ExportSelection, dest: Option<&Path>) -> Result<ExportReport> {
        self.locked(|store| {
            reconcile::reconcile(store)?;
            let dest = match dest {
                Some(dest) => dest.to_path_buf(),
                None if !store.document().default_export_path.is_empty() => {
                    PathBuf::from(&store.document().default_export_path)
                }
                None => {
                    return Err(RepoError::InvalidInput(
                        "no destination given and no default export path set".into(),
                    ));
                }
            };
            let skills = store.skills()?;
            bundle::export_bundle(store.document(), &skills, selection, &dest)
        })
    }

    /// Remove a skill's directory, metadata and preset membership.
    pub fn delete_skill(&mut self, id: &str) -> Result<Skill> {
        self.locked(|store| {
            let skill = store
                .skills()?
                .into_iter()
                .find(|s| s.id == id)
                .ok_or_else(|| RepoError::SkillNotFound(id.to_string()))?;
            remove_dir_if_exists(&skill.path)?;
            store.document_mut().forget_skill(id);
            store.persist()?;
            info!("deleted '{}' ({})", skill.name, hash::short(id));
            Ok(skill)
        })
    }

    pub fn update_metadata(&mut self, id: &str, patch: MetadataPatch) -> Result<Skill> {
        self.locked(|store| {
            let dir = store
                .layout()
                .skill_dirs()?
                .into_iter()
                .find(|d| d.digest == id)
                .ok_or_else(|| RepoError::SkillNotFound(id.to_string()))?;

            let meta = store.document_mut().skills.entry(id.to_string()).or_default();
            if let Some(tags) = patch.tags {
                meta.tags = normalize_tags(tags);
            }
            if let Some(name) = patch.name {
                meta.custom_name = non_empty(name);
            }
            if let Some(description) = patch.description {
                meta.custom_description = non_empty(description);
            }
            store.persist()?;
            Ok(store.describe(&dir))
        })
    }

    pub fn save_preset(&mut self, draft: PresetDraft, allow_overwrite: bool) -> Result<Preset> {
        self.locked(|store| {
            reconcile::reconcile(store)?;
            let skills = store.skills()?;
            let saved = preset::save(store.document_mut(), draft, allow_overwrite, &skills)?;
            store.persist()?;
            Ok(saved)
        })
    }

    pub fn delete_preset(&mut self, id: &str) -> Result<Preset> {
        self.locked(|store| {
            let removed = preset::delete(store.document_mut(), id)?;
            store.persist()?;
            info!("deleted preset '{}'", removed.name);
            Ok(removed)
        })
    }

    pub fn apply_preset(&mut self, id: &str, mode: ApplyMode, target: &Path) -> Result<ApplyReport> {
        self.locked(|store| {
            reconcile::reconcile(store)?;
            let preset = store
                .document()
                .preset(id)
                .cloned()
                .ok_or_else(|| RepoError::PresetNotFound(id.to_string()))?;
            let skills = store.skills()?;
            preset::apply(&preset, &skills, mode, target)
        })
    }

    pub fn set_default_export_path(&mut self, path: &Path) -> Result<()> {
        self.locked(|store| {
            store.document_mut().default_export_path = path.display().to_string();
            store.persist()
        })
    }

    // ---------------------------------------------------------------------
    // Reconciliation
    // ---------------------------------------------------------------------

    pub fn reconcile(&mut self) -> Result<ReconcileReport> {
        self.locked(reconcile::reconcile)
    }

    /// Record paths reported changed by an external watcher.
    pub fn notify_external_change<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.debouncer.record(paths)
    }

    /// Reconcile once the debounce window has passed since the last change.
    pub fn poll_external_changes(&mut self) -> Result<Option<ReconcileReport>> {
        if !self.debouncer.due() {
            return Ok(None);
        }
        let changed = self.debouncer.take();
        debug!("reconciling after {} external change(s)", changed.len());
        self.reconcile().map(Some)
    }

    // ---------------------------------------------------------------------

    fn scan_options(&self) -> ScanOptions {
        ScanOptions::from(&self.config.scan)
    }

    fn github_client(&mut self) -> Result<&GitHubClient> {
        if self.github.is_none() {
            self.github = Some(GitHubClient::from_config(&self.config.remote)?);
        }
        self.github
            .as_ref()
            .ok_or_else(|| RepoError::Remote("GitHub client unavailable".into()))
    }

    fn locked<T>(&mut self, op: impl FnOnce(&mut ConfigStore) -> Result<T>) -> Result<T> {
        with_lock(&mut self.store, self.lock_timeout, op)
    }
}

fn with_lock<T>(
    store: &mut ConfigStore,
    timeout: Duration,
    op: impl FnOnce(&mut ConfigStore) -> Result<T>,
) -> Result<T> {
    let _lock = RootLock::acquire_timeout(store.root(), timeout)?;
    store.reload()?;
    op(store)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::UnitTestFixture;

    fn engine(fixture: &UnitTestFixture) -> Engine {
        let mut config = Config::default();
        config.storage.root = fixture.data_path.join("repo").display().to_string();
        config.scan.global = vec![fixture.data_path.join("global").display().to_string()];
        config.scan.workspace = vec![".claude/skills".to_string()];
        config.watch.debounce_ms = 0;
        Engine::open(config, vec![fixture.data_path.join("ws")]).unwrap()
    }

    fn import_named(engine: &mut Engine, name: &str) -> ImportOutcome {
        let result = engine.scan().unwrap();
        let candidate = result
            .candidates()
            .find(|c| c.name == name)
            .cloned()
            .unwrap();
        engine.import(&candidate).unwrap()
    }

    #[test]
    fn scan_covers_global_and_workspace_roots() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        fixture.create_file("ws/.claude/skills/fmt/SKILL.md", "fmt");
        let mut engine = engine(&fixture);

        let result = engine.scan().unwrap();

        assert_eq!(result.classification.discoverable.len(), 2);
        assert_eq!(result.sources.len(), 2);
        assert!(result.sources.iter().all(SourceOutcome::is_ok));
    }

    #[test]
    fn imported_skill_moves_to_already_imported() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        import_named(&mut engine, "lint");

        let result = engine.scan().unwrap();
        assert!(result.classification.discoverable.is_empty());
        assert_eq!(result.classification.already_imported.len(), 1);
    }

    #[test]
    fn import_checked_reports_conflict_with_existing_entity() {
        let fixture = UnitTestFixture::new();
        let manifest = fixture.create_file("global/lint/SKILL.md", "v1");
        let mut engine = engine(&fixture);
        let first = import_named(&mut engine, "lint");

        std::fs::write(manifest, "v2").unwrap();
        let result = engine.scan().unwrap();
        let candidate = result.classification.discoverable[0].candidate.clone();
        assert!(result.classification.discoverable[0].conflict.is_some());

        let err = engine.import_checked(&candidate, false).unwrap_err();
        match err {
            RepoError::Conflict { existing_id, .. } => assert_eq!(existing_id, first.id),
            other => panic!("unexpected {other:?}"),
        }

        let second = engine.import_checked(&candidate, true).unwrap();
        assert_eq!(second.migrated_from.as_deref(), Some(first.id.as_str()));
    }

    #[test]
    fn resolve_skill_ref_accepts_prefix_and_name() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        let outcome = import_named(&mut engine, "lint");

        assert_eq!(engine.resolve_skill_ref(&outcome.id[..8]).unwrap().id, outcome.id);
        assert_eq!(engine.resolve_skill_ref("LINT").unwrap().id, outcome.id);
        assert!(matches!(
            engine.resolve_skill_ref("missing"),
            Err(RepoError::SkillNotFound(_))
        ));
    }

    #[test]
    fn delete_skill_strips_presets() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        let outcome = import_named(&mut engine, "lint");
        engine
            .save_preset(
                PresetDraft {
                    name: "ci".into(),
                    skill_ids: vec![outcome.id.clone()],
                    ..PresetDraft::default()
                },
                false,
            )
            .unwrap();

        engine.delete_skill(&outcome.id).unwrap();

        assert!(engine.list_skills().unwrap().is_empty());
        assert!(engine.list_presets().unwrap()[0].skill_ids.is_empty());
        assert!(matches!(engine.delete_skill(&outcome.id), Err(RepoError::SkillNotFound(_))));
    }

    #[test]
    fn update_metadata_normalises_tags_and_overrides() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        let outcome = import_named(&mut engine, "lint");

        let skill = engine
            .update_metadata(
                &outcome.id,
                MetadataPatch {
                    tags: Some(vec![" ci ".into(), String::new(), "ci".into(), "rust".into()]),
                    name: Some("Linter".into()),
                    description: None,
                },
            )
            .unwrap();

        assert_eq!(skill.tags, vec!["ci", "rust"]);
        assert_eq!(skill.name, "Linter");
    }

    #[test]
    fn external_deletion_is_reconciled_after_notification() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        let outcome = import_named(&mut engine, "lint");
        let manifest = engine
            .root()
            .join("skills")
            .join(&outcome.id)
            .join("SKILL.md");
        std::fs::remove_dir_all(manifest.parent().unwrap()).unwrap();

        assert_eq!(engine.notify_external_change([&manifest]), 1);
        let report = engine.poll_external_changes().unwrap().unwrap();
        assert_eq!(report.pruned_skills, vec![outcome.id]);
        assert!(engine.poll_external_changes().unwrap().is_none());
    }

    #[test]
    fn export_without_destination_uses_default_path() {
        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "lint");
        let mut engine = engine(&fixture);
        import_named(&mut engine, "lint");

        assert!(matches!(
            engine.export_bundle(&ExportSelection::All, None),
            Err(RepoError::InvalidInput(_))
        ));

        let out = fixture.data_path.join("exports");
        engine.set_default_export_path(&out).unwrap();
        let report = engine.export_bundle(&ExportSelection::All, None).unwrap();
        assert_eq!(report.destination, out);
        assert!(out.join("skills/lint/SKILL.md").is_file());
    }

    #[test]
    fn remote_import_stores_downloaded_digest_and_migrates() {
        use base64::Engine as _;
        use httpmock::prelude::*;

        let fixture = UnitTestFixture::new();
        fixture.create_file("global/lint/SKILL.md", "old lint");
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint")
                .query_param("ref", "main");
            then.status(200).json_body(serde_json::json!([
                { "name": "SKILL.md", "path": "skills/lint/SKILL.md", "type": "file" }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/acme/tools/contents/skills/lint/SKILL.md")
                .query_param("ref", "main");
            then.status(200).json_body(serde_json::json!({
                "content": base64::engine::general_purpose::STANDARD.encode("downloaded lint"),
                "encoding": "base64"
            }));
        });
        let client = GitHubClient::new(&server.base_url(), None).unwrap();
        let mut engine = engine(&fixture).with_github_client(client);
        let old = import_named(&mut engine, "lint");

        // Content moved on between scan and import.
        let candidate = DiscoveredCandidate {
            name: "lint".into(),
            locator: crate::core::CandidateLocator::Remote(crate::core::RemoteLocator {
                owner: "acme".into(),
                repo: "tools".into(),
                git_ref: "main".into(),
                path: "skills/lint".into(),
            }),
            digest: hash::digest_bytes(b"scanned lint"),
            description: None,
            source_location: "acme/tools@main".into(),
            source: SourceKind::Remote,
        };
        let outcome = engine.import(&candidate).unwrap();

        let downloaded = hash::digest_bytes(b"downloaded lint");
        assert_eq!(outcome.id, downloaded);
        assert_ne!(outcome.id, candidate.digest);
        assert_eq!(outcome.migrated_from.as_deref(), Some(old.id.as_str()));

        let skills = engine.list_skills().unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].id, downloaded);
        assert_eq!(skills[0].name, "lint");
        assert_eq!(skills[0].source.as_deref(), Some("github:acme/tools@main"));
        let stored = std::fs::read_to_string(skills[0].path.join("SKILL.md")).unwrap();
        assert_eq!(stored, "downloaded lint");
        assert!(!engine.root().join("skills").join(&old.id).exists());
    }

    #[test]
    fn mutation_times_out_while_root_is_locked() {
        let fixture = UnitTestFixture::new();
        let mut engine = engine(&fixture).with_lock_timeout(Duration::from_millis(60));
        let _held = RootLock::try_acquire(engine.root()).unwrap().unwrap();

        let err = engine
            .save_preset(
                PresetDraft {
                    name: "ci".into(),
                    ..PresetDraft::default()
                },
                false,
            )
            .unwrap_err();
        assert!(matches!(err, RepoError::LockTimeout(_)));
    }

    #[test]
    fn scan_remote_rejects_malformed_reference_before_io() {
        let fixture = UnitTestFixture::new();
        let mut engine = engine(&fixture);
        assert!(matches!(
            engine.scan_remote("not a repo"),
            Err(RepoError::InvalidInput(_))
        ));
    }
}

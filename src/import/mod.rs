//! Importing candidates into canonical storage.
//!
//! # Pipeline
//!
//! 1. **Locate** the stored skill with the same display name, if any.
//! 2. **Materialize** the candidate into a private staging directory (local
//!    copy or recursive remote download).
//! 3. **Re-hash** the manifest as written; this digest is the skill id.
//! 4. **Swap** the staged directory into `skills/<digest>` and drop the
//!    previous same-named directory.
//! 5. **Migrate identity** when the digest changed: metadata and preset
//!    membership move from the old id to the new one.
//! 6. **Persist** the document.
//!
//! Nothing in the document is touched until the content has landed. Whether a
//! same-name import is allowed at all is the caller's decision; once invoked,
//! [`import_candidate`] always overwrites.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{CandidateLocator, DiscoveredCandidate, hash, manifest};
use crate::dedup::name_key;
use crate::error::{RepoError, Result};
use crate::scan::github::{self, GitHubClient};
use crate::storage::ConfigStore;
use crate::utils::fs::{copy_dir_all, ensure_dir, remove_dir_if_exists};

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub id: String,
    pub name: String,
    /// Id of the same-named skill this import replaced, when it differed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<String>,
    pub files: u64,
}

/// Copy or download candidate content into `dest`.
pub fn materialize(
    candidate: &DiscoveredCandidate,
    dest: &Path,
    github: Option<&GitHubClient>,
) -> Result<u64> {
    match &candidate.locator {
        CandidateLocator::Local { path } => copy_dir_all(path, dest),
        CandidateLocator::Remote(locator) => {
            let client = github.ok_or_else(|| {
                RepoError::Remote(format!("no GitHub client for {}", locator.html_url()))
            })?;
            github::download_dir(client, locator, dest)
        }
    }
}

/// Import one candidate, returning the id it is stored under.
pub fn import_candidate(
    store: &mut ConfigStore,
    candidate: &DiscoveredCandidate,
    github: Option<&GitHubClient>,
) -> Result<ImportOutcome> {
    let existing = store
        .skills()?
        .into_iter()
        .find(|s| name_key(&s.name) == name_key(&candidate.name));

    let staging = store
        .layout()
        .staging_dir()
        .join(uuid::Uuid::new_v4().to_string());
    ensure_dir(&staging)?;

    let landed = stage(store, candidate, &staging, github).and_then(|(digest, files)| {
        let target = store.layout().skill_dir(&digest);
        swap_into_place(&staging, &target).map(|()| (digest, target, files))
    });
    cleanup_staging(&staging);
    cleanup_staging(&store.layout().staging_dir());
    let (new_digest, target, files) = landed?;

    let mut migrated_from = None;
    if let Some(existing) = &existing {
        if existing.path != target {
            remove_dir_if_exists(&existing.path)?;
        }
        if existing.id != new_digest {
            info!(
                "'{}' changed: migrating {} -> {}",
                candidate.name,
                hash::short(&existing.id),
                hash::short(&new_digest)
            );
            store.document_mut().migrate_identity(&existing.id, &new_digest);
            migrated_from = Some(existing.id.clone());
        }
    }

    let has_own_name = manifest::parse_file(&store.layout().manifest_in(&target))
        .name
        .is_some();
    let meta = store
        .document_mut()
        .skills
        .entry(new_digest.clone())
        .or_default();
    if !has_own_name && meta.custom_name.is_none() {
        meta.custom_name = Some(candidate.name.clone());
    }
    meta.source = Some(source_label(candidate));
    meta.imported_at = Some(Utc::now());

    store.persist()?;
    info!("imported '{}' as {}", candidate.name, hash::short(&new_digest));

    Ok(ImportOutcome {
        id: new_digest,
        name: candidate.name.clone(),
        migrated_from,
        files,
    })
}

fn stage(
    store: &ConfigStore,
    candidate: &DiscoveredCandidate,
    staging: &Path,
    github: Option<&GitHubClient>,
) -> Result<(String, u64)> {
    let files = materialize(candidate, staging, github)?;
    let manifest_path = store.layout().manifest_in(staging);
    if !manifest_path.is_file() {
        return Err(RepoError::InvalidInput(format!(
            "{} has no {}",
            candidate.location(),
            store.layout().manifest_file()
        )));
    }
    let digest = hash::digest_file(&manifest_path)?;
    if digest != candidate.digest {
        debug!(
            "content of '{}' changed while materializing ({} -> {})",
            candidate.name,
            hash::short(&candidate.digest),
            hash::short(&digest)
        );
    }
    Ok((digest, files))
}

fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    remove_dir_if_exists(target)?;
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    std::fs::rename(staging, target)?;
    Ok(())
}

/// Remove a staging directory; only logs on failure.
fn cleanup_staging(dir: &Path) {
    let result = if dir.ends_with(crate::storage::layout::STAGING_DIR) {
        // Shared parent: only remove once empty.
        match std::fs::read_dir(dir) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    std::fs::remove_dir(dir)
                } else {
                    Ok(())
                }
            }
            Err(_) => Ok(()),
        }
    } else {
        std::fs::remove_dir_all(dir)
    };
    if let Err(err) = result {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to clean staging {}: {err}", dir.display());
        }
    }
}

/// Source tag stored in metadata.
fn source_label(candidate: &DiscoveredCandidate) -> String {
    match &candidate.locator {
        CandidateLocator::Local { .. } => {
            format!("{}:{}", candidate.source, candidate.source_location)
        }
        CandidateLocator::Remote(remote) => {
            format!("github:{}/{}@{}", remote.owner, remote.repo, remote.git_ref)
        }
    }
}

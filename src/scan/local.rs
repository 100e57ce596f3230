//! Depth-bounded discovery of skill directories on the local filesystem.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::{CandidateLocator, DiscoveredCandidate, SourceKind, hash, manifest};
use crate::error::Result;
use crate::scan::{ScanOptions, SourceOutcome};

/// Find directories that directly contain the manifest.
///
/// The walk does not descend into a skill directory once found. Unreadable
/// subdirectories are skipped.
pub fn find_skill_dirs(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(root)?;
    if !metadata.is_dir() {
        return Err(crate::error::RepoError::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut found = Vec::new();
    let mut walker = WalkDir::new(root)
        .max_depth(options.max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_ignored(entry.file_name(), &options.ignore_dirs)
        });

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.path().join(&options.manifest_file).is_file() {
            found.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }
    Ok(found)
}

fn is_ignored(name: &std::ffi::OsStr, ignore: &[String]) -> bool {
    let name = name.to_string_lossy();
    ignore.iter().any(|i| *i == name)
}

/// Build a candidate from a local skill directory.
pub fn candidate_from_dir(
    dir: &Path,
    manifest_file: &str,
    source: SourceKind,
    source_location: &str,
) -> Result<DiscoveredCandidate> {
    let bytes = std::fs::read(dir.join(manifest_file))?;
    let info = manifest::parse(&String::from_utf8_lossy(&bytes));
    let name = info.name.unwrap_or_else(|| dir_name(dir));

    Ok(DiscoveredCandidate {
        name,
        locator: CandidateLocator::Local {
            path: dir.to_path_buf(),
        },
        digest: hash::digest_bytes(&bytes),
        description: info.description,
        source_location: source_location.to_string(),
        source,
    })
}

/// Scan one root. Never fails; problems land in the outcome.
pub fn scan_root(
    root: &Path,
    kind: SourceKind,
    options: &ScanOptions,
) -> (Vec<DiscoveredCandidate>, SourceOutcome) {
    let label = root.display().to_string();
    let dirs = match find_skill_dirs(root, options) {
        Ok(dirs) => dirs,
        Err(err) => {
            debug!("{kind} root {label} contributes nothing: {err}");
            return (Vec::new(), SourceOutcome::failed(label, kind, err.to_string()));
        }
    };

    let mut candidates = Vec::with_capacity(dirs.len());
    for dir in dirs {
        match candidate_from_dir(&dir, &options.manifest_file, kind, &label) {
            Ok(candidate) => candidates.push(candidate),
            Err(err) => warn!("skipping {}: {err}", dir.display()),
        }
    }
    let outcome = SourceOutcome::ok(label, kind, candidates.len());
    (candidates, outcome)
}

pub(crate) fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "skill".to_string())
}

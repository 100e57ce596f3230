//! Source scanning.
//!
//! Local roots are walked with a depth bound; GitHub repositories are listed
//! through the REST API. A failing source never fails the scan: its error is
//! recorded as a [`SourceOutcome`] and the other sources still contribute.

pub mod github;
pub mod local;

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::core::{DiscoveredCandidate, SourceKind};

/// Options for local walks.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub manifest_file: String,
    pub ignore_dirs: Vec<String>,
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            manifest_file: config.manifest_file.clone(),
            ignore_dirs: config.ignore_dirs.clone(),
        }
    }
}

/// How one source fared during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: String,
    pub kind: SourceKind,
    pub candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    #[must_use]
    pub fn ok(source: impl Into<String>, kind: SourceKind, candidates: usize) -> Self {
        Self {
            source: source.into(),
            kind,
            candidates,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(source: impl Into<String>, kind: SourceKind, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            candidates: 0,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Candidates found by one scan, plus per-source outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub candidates: Vec<DiscoveredCandidate>,
    pub sources: Vec<SourceOutcome>,
    /// A remote listing hit its candidate cap and dropped the rest.
    pub truncated: bool,
}

impl ScanReport {
    /// Append another report, keeping source order.
    pub fn extend(&mut self, other: Self) {
        self.candidates.extend(other.candidates);
        self.sources.extend(other.sources);
        self.truncated |= other.truncated;
    }

    /// Drop candidates whose digest was already seen; first occurrence wins.
    pub fn dedup_by_digest(&mut self) {
        let mut seen = HashSet::new();
        self.candidates.retain(|c| seen.insert(c.digest.clone()));
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| !s.is_ok())
    }
}

/// Walk every root in order, recording each as a source, then dedup by digest.
#[must_use]
pub fn scan_local_roots(roots: &[(PathBuf, SourceKind)], options: &ScanOptions) -> ScanReport {
    let mut report = ScanReport::default();
    for (root, kind) in roots {
        let (candidates, outcome) = local::scan_root(root, *kind, options);
        report.candidates.extend(candidates);
        report.sources.push(outcome);
    }
    report.dedup_by_digest();
    report
}

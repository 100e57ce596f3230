//! Skill and candidate types shared across the engine.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An imported skill as seen by callers.
///
/// Built from the on-disk directory plus its persisted metadata; never stored
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    /// Digest of the manifest currently at `path`.
    pub id: String,
    /// Front matter name, else the stored override, else the directory name.
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_at: Option<DateTime<Utc>>,
}

/// Where a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Global,
    Workspace,
    Custom,
    Remote,
    Bundle,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Workspace => "workspace",
            Self::Custom => "custom",
            Self::Remote => "remote",
            Self::Bundle => "bundle",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory inside a GitHub repository, pinned to a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocator {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit used for every nested request.
    pub git_ref: String,
    /// Directory path relative to the repository root; empty for the root.
    pub path: String,
}

impl RemoteLocator {
    /// Browser URL for the directory.
    #[must_use]
    pub fn html_url(&self) -> String {
        if self.path.is_empty() {
            format!("https://github.com/{}/{}/tree/{}", self.owner, self.repo, self.git_ref)
        } else {
            format!(
                "https://github.com/{}/{}/tree/{}/{}",
                self.owner, self.repo, self.git_ref, self.path
            )
        }
    }
}

/// Where a candidate's content lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateLocator {
    Local { path: PathBuf },
    Remote(RemoteLocator),
}

/// A skill-shaped directory found by a scan, not yet imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredCandidate {
    pub name: String,
    pub locator: CandidateLocator,
    pub digest: String,
    pub description: Option<String>,
    /// Root or repository the candidate was found under.
    pub source_location: String,
    pub source: SourceKind,
}

impl DiscoveredCandidate {
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.locator, CandidateLocator::Remote(_))
    }

    #[must_use]
    pub fn remote_url(&self) -> Option<String> {
        match &self.locator {
            CandidateLocator::Remote(remote) => Some(remote.html_url()),
            CandidateLocator::Local { .. } => None,
        }
    }

    /// Path or URL for display.
    #[must_use]
    pub fn location(&self) -> String {
        match &self.locator {
            CandidateLocator::Local { path } => path.display().to_string(),
            CandidateLocator::Remote(remote) => remote.html_url(),
        }
    }
}

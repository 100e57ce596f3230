//! Core skill types and logic

pub mod hash;
pub mod manifest;
pub mod types;

pub use manifest::ManifestInfo;
pub use types::{CandidateLocator, DiscoveredCandidate, RemoteLocator, Skill, SourceKind};

/// File that marks a directory as a skill.
pub const MANIFEST_FILE: &str = "SKILL.md";

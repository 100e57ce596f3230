//! Error handling for skillrepo.
//!
//! This module provides:
//! - [`RepoError`]: The main error enum for all repository operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Which kind of entity a [`RepoError::Conflict`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Skill,
    Preset,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skill => write!(f, "Skill"),
            Self::Preset => write!(f, "Preset"),
        }
    }
}

/// Main error type for repository operations.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("{kind} conflict: '{name}' already exists ({existing_id})")]
    Conflict {
        kind: ConflictKind,
        name: String,
        existing_id: String,
    },

    #[error("Remote source error: {0}")]
    Remote(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Lock failed: {0}")]
    LockFailed(String),
}

impl RepoError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Archive(_) => ErrorCode::ArchiveError,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::PresetNotFound(_) => ErrorCode::PresetNotFound,
            Self::Conflict {
                kind: ConflictKind::Skill,
                ..
            } => ErrorCode::SkillConflict,
            Self::Conflict {
                kind: ConflictKind::Preset,
                ..
            } => ErrorCode::PresetConflict,
            Self::Remote(_) => ErrorCode::RemoteSourceError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::LockTimeout(_) => ErrorCode::LockTimeout,
            Self::LockFailed(_) => ErrorCode::LockFailed,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::SkillNotFound(skill) => Some(serde_json::json!({ "skill": skill })),
            Self::PresetNotFound(preset) => Some(serde_json::json!({ "preset": preset })),
            Self::Conflict {
                kind,
                name,
                existing_id,
            } => Some(serde_json::json!({
                "kind": kind,
                "name": name,
                "existing_id": existing_id,
            })),
            _ => None,
        }
    }

    /// True for the recoverable conflict condition a caller can retry with overwrite.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_repo_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Used for robot mode output where callers need to parse errors and take
/// the appropriate action (for example, retrying with `--force`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    /// Error category (e.g., "skill", "config", "network")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`RepoError`].
    #[must_use]
    pub fn from_repo_error(err: &RepoError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<RepoError> for StructuredError {
    fn from(err: RepoError) -> Self {
        Self::from_repo_error(&err)
    }
}

impl From<&RepoError> for StructuredError {
    fn from(err: &RepoError) -> Self {
        Self::from_repo_error(err)
    }
}

/// Result type alias using [`RepoError`].
pub type Result<T> = std::result::Result<T, RepoError>;

//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Skill and preset errors
//! - 3xx: Config errors
//! - 5xx: Network / remote source errors
//! - 6xx: Storage errors
//! - 8xx: Validation and lock errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Skill and preset errors (1xx)
    // ========================================
    /// E101: Requested skill is not in the repository
    SkillNotFound,
    /// E102: A different skill already uses this name
    SkillConflict,
    /// E111: Requested preset does not exist
    PresetNotFound,
    /// E112: Another preset already uses this name or id
    PresetConflict,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Settings file has invalid syntax or values
    ConfigInvalid,

    // ========================================
    // Network errors (5xx)
    // ========================================
    /// E504: Remote source request failed
    RemoteSourceError,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E605: Serialization/deserialization failed
    SerializationError,
    /// E606: Archive could not be read or written
    ArchiveError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Input rejected before any I/O
    InvalidInput,
    /// E851: Failed to acquire the repository lock within timeout
    LockTimeout,
    /// E852: Failed to acquire the repository lock
    LockFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SkillNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillNotFound => 101,
            Self::SkillConflict => 102,
            Self::PresetNotFound => 111,
            Self::PresetConflict => 112,
            Self::ConfigInvalid => 302,
            Self::RemoteSourceError => 504,
            Self::SerializationError => 605,
            Self::ArchiveError => 606,
            Self::InvalidInput => 801,
            Self::LockTimeout => 851,
            Self::LockFailed => 852,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillNotFound => "Run `skr list` to see imported skills, or `skr scan` to find importable ones",
            Self::SkillConflict => "Re-run with --force to overwrite the existing skill, or rename one of them",
            Self::PresetNotFound => "Run `skr preset list` to see saved presets",
            Self::PresetConflict => "Re-run with --force to replace the existing preset, or choose another name",
            Self::ConfigInvalid => "Run `skr config` to see current values. Check TOML syntax in the settings file",
            Self::RemoteSourceError => "Check the repository reference and network access. Set SKR_GITHUB_TOKEN if rate limited",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::ArchiveError => "The bundle archive is unreadable. Re-export it or import the unpacked directory",
            Self::InvalidInput => "Check the arguments and try again",
            Self::LockTimeout => "Another process may be holding the repository lock. Wait and retry",
            Self::LockFailed => "Failed to acquire the repository lock. Check for other skr processes",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SerializationError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "skill",
            3 => "config",
            5 => "network",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::SkillNotFound,
            Self::SkillConflict,
            Self::PresetNotFound,
            Self::PresetConflict,
            Self::ConfigInvalid,
            Self::RemoteSourceError,
            Self::SerializationError,
            Self::ArchiveError,
            Self::InvalidInput,
            Self::LockTimeout,
            Self::LockFailed,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

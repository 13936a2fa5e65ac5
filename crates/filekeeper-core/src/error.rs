//! Error and warning types shared by every filekeeper crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filetype::FileTypeKey;

/// Errors raised by filekeeper operations.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// No file in the folder belongs to the requested type.
    #[error("No file matching {key} in {folder}")]
    NotFound { folder: PathBuf, key: FileTypeKey },

    /// I/O failure at the filesystem boundary.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required configuration value is absent.
    #[error("Missing configuration value: {key}")]
    ConfigurationMissing { key: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A settings file could not be read or parsed.
    #[error("Failed to load settings from {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The folder to operate on is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl KeeperError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only signals degraded behavior.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::ConfigurationMissing { .. })
    }
}

/// Result alias for filekeeper operations.
pub type Result<T> = std::result::Result<T, KeeperError>;

/// Kind of non-fatal warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// The prefix delimiter was not found, the dot fallback was used.
    DelimiterMissing,
    /// The entry matched an exclude pattern.
    Excluded,
    /// Error reading metadata.
    MetadataError,
}

/// Non-fatal diagnostic collected while inspecting a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Path the warning refers to.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl Warning {
    /// Create a new warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a delimiter-missing warning.
    pub fn delimiter_missing(path: impl Into<PathBuf>, delimiter: &str, prefix: &str) -> Self {
        Self::new(
            path,
            format!("Delimiter {delimiter:?} not found, using prefix {prefix:?}"),
            WarningKind::DelimiterMissing,
        )
    }

    /// Create a metadata error warning.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(
            path,
            format!("Metadata error: {error}"),
            WarningKind::MetadataError,
        )
    }
}

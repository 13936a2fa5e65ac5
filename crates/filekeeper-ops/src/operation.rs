//! Per-file results of batch operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A failure affecting a single file within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// The type of operation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Delete,
    Trash,
    Compress,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delete => write!(f, "Delete"),
            Self::Trash => write!(f, "Trash"),
            Self::Compress => write!(f, "Compress"),
        }
    }
}

/// Aggregate result of a completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationComplete {
    /// The type of operation.
    pub operation_type: OperationType,
    /// Number of items successfully processed.
    pub succeeded: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Total bytes processed.
    pub bytes_processed: u64,
    /// Errors that occurred.
    pub errors: Vec<OperationError>,
}

impl OperationComplete {
    /// Check if the operation was fully successful.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// One-line summary, e.g. `Deleted 3 files (4096 bytes freed), 1 failed`.
    pub fn summary(&self) -> String {
        let (action, bytes_label) = match self.operation_type {
            OperationType::Delete => ("Deleted", "freed"),
            OperationType::Trash => ("Trashed", "freed"),
            OperationType::Compress => ("Compressed", "read"),
        };
        let noun = if self.succeeded == 1 { "file" } else { "files" };

        let mut summary = format!(
            "{action} {} {noun} ({} bytes {bytes_label})",
            self.succeeded, self.bytes_processed
        );
        if self.failed > 0 {
            summary.push_str(&format!(", {} failed", self.failed));
        }
        summary
    }
}

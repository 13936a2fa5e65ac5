//! Keep-newest-N retention passes.
//!
//! A pass is split in two: [`RetentionManager::plan`] snapshots the folder and
//! ranks the matching files, [`RetentionPlan::execute`] deletes the surplus.
//! Files created after the snapshot are not considered; files removed after it
//! show up as per-file errors without stopping the pass.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use filekeeper_analyze::{FileEntry, list_group};
use filekeeper_core::{FileTypeKey, RetentionConfig, Result, classify};

use crate::operation::{OperationComplete, OperationError, OperationType};

/// The ranked contents of one retention group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPlan {
    /// Folder the group was read from.
    pub folder: PathBuf,
    /// Type key the group was built from.
    pub key: FileTypeKey,
    /// Files to keep, newest first.
    pub keep: Vec<FileEntry>,
    /// Files to delete, newest first.
    pub delete: Vec<FileEntry>,
}

impl RetentionPlan {
    /// Rank `group` newest first and split it after `keep` entries.
    ///
    /// Ties in modification time are broken by name, the later name ranking
    /// as newer.
    pub fn from_group(
        folder: impl Into<PathBuf>,
        key: FileTypeKey,
        mut group: Vec<FileEntry>,
        keep: usize,
    ) -> Self {
        group.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        let delete = group.split_off(keep.min(group.len()));
        Self {
            folder: folder.into(),
            key,
            keep: group,
            delete,
        }
    }

    /// Number of files matching the key at snapshot time.
    pub fn matched(&self) -> usize {
        self.keep.len() + self.delete.len()
    }

    /// Delete every file in [`delete`](Self::delete).
    ///
    /// Failures are recorded per file; the remaining files are still processed.
    pub fn execute(&self, use_trash: bool) -> RetentionReport {
        let mut report = RetentionReport {
            folder: self.folder.clone(),
            key: self.key.clone(),
            kept: self.keep.iter().map(|e| e.path.clone()).collect(),
            deleted: Vec::with_capacity(self.delete.len()),
            errors: Vec::new(),
            bytes_freed: 0,
            used_trash: use_trash,
        };

        for entry in &self.delete {
            match remove(&entry.path, use_trash) {
                Ok(()) => {
                    tracing::info!(path = %entry.path.display(), "deleted file");
                    report.bytes_freed += entry.size;
                    report.deleted.push(entry.path.clone());
                }
                Err(message) => {
                    tracing::warn!(
                        path = %entry.path.display(),
                        error = %message,
                        "failed to delete file"
                    );
                    report.errors.push(OperationError::new(&entry.path, message));
                }
            }
        }

        report
    }
}

fn remove(path: &Path, use_trash: bool) -> std::result::Result<(), String> {
    if use_trash {
        trash::delete(path).map_err(|e| format!("Failed to move to trash: {e}"))
    } else {
        fs::remove_file(path).map_err(|e| format!("Failed to delete: {e}"))
    }
}

/// Outcome of an executed retention pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionReport {
    /// Folder the pass ran in.
    pub folder: PathBuf,
    /// Type key of the group.
    pub key: FileTypeKey,
    /// Files left in place, newest first.
    pub kept: Vec<PathBuf>,
    /// Files removed.
    pub deleted: Vec<PathBuf>,
    /// Files that could not be removed.
    pub errors: Vec<OperationError>,
    /// Bytes reclaimed, as of the snapshot.
    pub bytes_freed: u64,
    /// Whether files went to the trash rather than being unlinked.
    pub used_trash: bool,
}

impl RetentionReport {
    /// Number of files removed.
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Check if every planned deletion succeeded.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Summarize as an [`OperationComplete`].
    pub fn complete(&self) -> OperationComplete {
        OperationComplete {
            operation_type: if self.used_trash {
                OperationType::Trash
            } else {
                OperationType::Delete
            },
            succeeded: self.deleted.len(),
            failed: self.errors.len(),
            bytes_processed: self.bytes_freed,
            errors: self.errors.clone(),
        }
    }
}

/// Applies a [`RetentionConfig`] to folders.
#[derive(Debug, Clone, Default)]
pub struct RetentionManager {
    config: RetentionConfig,
}

impl RetentionManager {
    /// Create a manager with the given config.
    pub fn new(config: RetentionConfig) -> Self {
        Self { config }
    }

    /// The active config.
    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Snapshot `folder` and rank the files sharing `filename_template`'s type.
    #[instrument(skip_all, fields(folder = %folder.as_ref().display(), template = filename_template))]
    pub fn plan(&self, folder: impl AsRef<Path>, filename_template: &str) -> Result<RetentionPlan> {
        let folder = folder.as_ref();
        let key = classify(filename_template, &self.config.prefix_delimiter);
        let group = list_group(folder, &key)?;

        let plan = RetentionPlan::from_group(folder, key, group, self.config.keep);
        tracing::debug!(
            key = %plan.key,
            matched = plan.matched(),
            to_delete = plan.delete.len(),
            "planned retention pass"
        );
        Ok(plan)
    }

    /// Delete all but the `keep` newest files of `filename_template`'s type.
    ///
    /// Only a failure to list `folder` is returned as an error; failures to
    /// delete individual files are collected in the report.
    pub fn enforce(
        &self,
        folder: impl AsRef<Path>,
        filename_template: &str,
    ) -> Result<RetentionReport> {
        let plan = self.plan(folder, filename_template)?;
        Ok(plan.execute(self.config.use_trash))
    }
}

/// Run one retention pass without building a [`RetentionManager`].
pub fn enforce(
    folder: impl AsRef<Path>,
    filename_template: &str,
    prefix_delimiter: &str,
    keep: usize,
) -> Result<RetentionReport> {
    RetentionManager::new(RetentionConfig::new(prefix_delimiter, keep))
        .enforce(folder, filename_template)
}

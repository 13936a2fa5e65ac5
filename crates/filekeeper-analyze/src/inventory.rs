//! Folder inventory by file type.
//!
//! Only the immediate entries of a folder are inspected; subdirectories are
//! never descended into and are not themselves grouped.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use filekeeper_core::{
    FileTypeKey, InventoryConfig, KeeperError, Result, Warning, WarningKind, classify_detailed,
};

/// A regular file inside an inspected folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name (lossy UTF-8).
    pub name: String,
    /// Last modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub size: u64,
}

/// Distinct file types found in a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInventory {
    /// The inspected folder.
    pub folder: PathBuf,
    /// Distinct keys, in sorted order.
    pub types: BTreeSet<FileTypeKey>,
    /// Number of files classified.
    pub files_classified: usize,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Warning>,
}

impl TypeInventory {
    /// Number of distinct types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &FileTypeKey) -> bool {
        self.types.contains(key)
    }
}

/// Enumerates file types and retention groups within a folder.
pub struct FileTypeInventory {
    config: InventoryConfig,
    excludes: GlobSet,
}

impl FileTypeInventory {
    /// Create an inventory with the given config.
    ///
    /// Fails with [`KeeperError::InvalidConfig`] if an exclude pattern is not a
    /// valid glob.
    pub fn new(config: InventoryConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| KeeperError::InvalidConfig {
                message: format!("Bad exclude pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let excludes = builder.build().map_err(|e| KeeperError::InvalidConfig {
            message: e.to_string(),
        })?;

        Ok(Self { config, excludes })
    }

    /// Create an inventory splitting names on `prefix_delimiter`.
    pub fn with_delimiter(prefix_delimiter: impl Into<String>) -> Self {
        Self {
            config: InventoryConfig::new(prefix_delimiter),
            excludes: GlobSet::empty(),
        }
    }

    /// The active config.
    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Collect the distinct file types among the visible files of `folder`.
    ///
    /// Entries whose name starts with `.` are skipped.
    pub fn distinct_types(&self, folder: impl AsRef<Path>) -> Result<TypeInventory> {
        let folder = folder.as_ref();
        let mut warnings = Vec::new();
        let entries = self.visible_files(folder, &mut warnings)?;
        let delimiter = self.config.prefix_delimiter.as_str();

        let mut types = BTreeSet::new();
        for entry in &entries {
            let classification = classify_detailed(&entry.name, delimiter);
            if classification.source.is_fallback() && !delimiter.is_empty() {
                tracing::debug!(
                    file = %entry.name,
                    prefix = %classification.key.prefix,
                    "delimiter not found, using fallback prefix"
                );
                warnings.push(Warning::delimiter_missing(
                    &entry.path,
                    delimiter,
                    &classification.key.prefix,
                ));
            }
            types.insert(classification.key);
        }

        Ok(TypeInventory {
            folder: folder.to_path_buf(),
            types,
            files_classified: entries.len(),
            warnings,
        })
    }

    /// Files of `folder` belonging to `key`, oldest first.
    pub fn group(&self, folder: impl AsRef<Path>, key: &FileTypeKey) -> Result<Vec<FileEntry>> {
        let folder = folder.as_ref();
        let mut warnings = Vec::new();
        let mut group: Vec<FileEntry> = read_files(folder, &mut warnings)?
            .into_iter()
            .filter(|entry| key.matches(&entry.name) && !self.is_excluded(&entry.name))
            .collect();
        sort_oldest_first(&mut group);
        Ok(group)
    }

    /// The most recently modified file of `key` in `folder`.
    ///
    /// Fails with [`KeeperError::NotFound`] when no file matches.
    pub fn newest_of_type(&self, folder: impl AsRef<Path>, key: &FileTypeKey) -> Result<PathBuf> {
        let folder = folder.as_ref();
        self.group(folder, key)?
            .pop()
            .map(|entry| entry.path)
            .ok_or_else(|| KeeperError::NotFound {
                folder: folder.to_path_buf(),
                key: key.clone(),
            })
    }

    /// The newest file for every distinct type in `folder`.
    pub fn newest_of_each_type(
        &self,
        folder: impl AsRef<Path>,
    ) -> Result<Vec<(FileTypeKey, PathBuf)>> {
        let folder = folder.as_ref();
        let inventory = self.distinct_types(folder)?;
        let mut newest = Vec::with_capacity(inventory.types.len());
        for key in inventory.types {
            match self.newest_of_type(folder, &key) {
                Ok(path) => newest.push((key, path)),
                // A prefix that overlaps its own extension matches nothing,
                // and files can vanish between the two listings.
                Err(KeeperError::NotFound { .. }) => {
                    tracing::debug!(key = %key, "type has no matching file");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(newest)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excludes.is_match(name)
    }

    fn visible_files(&self, folder: &Path, warnings: &mut Vec<Warning>) -> Result<Vec<FileEntry>> {
        let mut visible = Vec::new();
        for entry in read_files(folder, warnings)? {
            if entry.name.starts_with('.') {
                continue;
            }
            if self.is_excluded(&entry.name) {
                warnings.push(Warning::new(
                    &entry.path,
                    "Excluded by pattern",
                    WarningKind::Excluded,
                ));
                continue;
            }
            visible.push(entry);
        }
        Ok(visible)
    }
}

/// Files of `folder` belonging to `key`, oldest first, with no exclusions.
///
/// Ties in modification time are broken by name so the order is stable.
pub fn list_group(folder: impl AsRef<Path>, key: &FileTypeKey) -> Result<Vec<FileEntry>> {
    let mut warnings = Vec::new();
    let mut group: Vec<FileEntry> = read_files(folder.as_ref(), &mut warnings)?
        .into_iter()
        .filter(|entry| key.matches(&entry.name))
        .collect();
    sort_oldest_first(&mut group);
    Ok(group)
}

/// Sort by modification time ascending, then by name.
pub fn sort_oldest_first(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
}

/// Read the regular files directly inside `folder`.
fn read_files(folder: &Path, warnings: &mut Vec<Warning>) -> Result<Vec<FileEntry>> {
    let metadata = fs::metadata(folder).map_err(|e| KeeperError::io(folder, e))?;
    if !metadata.is_dir() {
        return Err(KeeperError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(folder).map_err(|e| KeeperError::io(folder, e))? {
        let entry = entry.map_err(|e| KeeperError::io(folder, e))?;
        let path = entry.path();

        // Follows symlinks so a link to a file is grouped like the file.
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                warnings.push(Warning::metadata_error(&path, &e));
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                warnings.push(Warning::metadata_error(&path, &e));
                continue;
            }
        };

        files.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            modified,
            size: metadata.len(),
        });
    }

    Ok(files)
}

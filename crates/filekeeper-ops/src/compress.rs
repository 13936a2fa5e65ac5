//! Gzip normalization of files into a destination folder.
//!
//! Every output is written to a temporary file inside the destination folder
//! and renamed into place, so a failed write never leaves a partial file at
//! the destination path.

use std::fs::{self, File, Metadata};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::instrument;

use filekeeper_core::{CompressionConfig, KeeperError, Result};

use crate::operation::{OperationComplete, OperationError, OperationType};

/// Suffix appended to files that get compressed.
pub const GZIP_SUFFIX: &str = ".gz";

/// Outcome of a batch normalization, one entry per input in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompressionReport {
    /// Destination path or failure for each input.
    pub outputs: Vec<std::result::Result<PathBuf, OperationError>>,
    /// Total bytes read from the inputs that succeeded.
    pub bytes_read: u64,
}

impl CompressionReport {
    /// Paths written successfully.
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.outputs.iter().filter_map(|o| o.as_ref().ok())
    }

    /// Inputs that failed.
    pub fn errors(&self) -> impl Iterator<Item = &OperationError> {
        self.outputs.iter().filter_map(|o| o.as_ref().err())
    }

    /// Check if every input was written.
    pub fn is_success(&self) -> bool {
        self.outputs.iter().all(|o| o.is_ok())
    }

    /// Summarize as an [`OperationComplete`].
    pub fn complete(&self) -> OperationComplete {
        let errors: Vec<OperationError> = self.errors().cloned().collect();
        OperationComplete {
            operation_type: OperationType::Compress,
            succeeded: self.outputs.len() - errors.len(),
            failed: errors.len(),
            bytes_processed: self.bytes_read,
            errors,
        }
    }
}

/// Ensures files land in a folder gzip-compressed.
#[derive(Debug, Clone, Default)]
pub struct CompressionNormalizer {
    config: CompressionConfig,
}

impl CompressionNormalizer {
    /// Create a normalizer with the given config.
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// The active config.
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Destination path `source` would be written to inside `dest_dir`.
    ///
    /// Already-compressed names are kept as is; everything else gains `.gz`.
    pub fn destination_for(&self, source: &Path, dest_dir: &Path) -> Option<PathBuf> {
        let name = source.file_name()?.to_string_lossy();
        Some(dest_dir.join(self.output_name(&name)))
    }

    fn output_name(&self, name: &str) -> String {
        if self.config.is_precompressed(name) {
            name.to_string()
        } else {
            format!("{name}{GZIP_SUFFIX}")
        }
    }

    /// Write `source` into `dest_dir`, compressing it unless it already is.
    ///
    /// The destination folder is created if missing and an existing file at
    /// the destination path is replaced. Returns the destination path.
    pub fn normalize(&self, source: impl AsRef<Path>, dest_dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.normalize_one(source.as_ref(), dest_dir.as_ref())
            .map(|(dest, _)| dest)
    }

    /// Normalize each of `sources` into `dest_dir`.
    ///
    /// A failing input does not stop the batch.
    pub fn normalize_batch<P: AsRef<Path>>(
        &self,
        sources: &[P],
        dest_dir: impl AsRef<Path>,
    ) -> CompressionReport {
        let dest_dir = dest_dir.as_ref();
        let mut report = CompressionReport {
            outputs: Vec::with_capacity(sources.len()),
            bytes_read: 0,
        };

        for source in sources {
            let source = source.as_ref();
            match self.normalize_one(source, dest_dir) {
                Ok((dest, bytes)) => {
                    report.bytes_read += bytes;
                    report.outputs.push(Ok(dest));
                }
                Err(e) => {
                    tracing::warn!(source = %source.display(), error = %e, "failed to normalize file");
                    report.outputs.push(Err(OperationError::new(source, e.to_string())));
                }
            }
        }

        report
    }

    #[instrument(skip_all, fields(source = %source.display()))]
    fn normalize_one(&self, source: &Path, dest_dir: &Path) -> Result<(PathBuf, u64)> {
        let metadata = fs::metadata(source).map_err(|e| KeeperError::io(source, e))?;
        if !metadata.is_file() {
            return Err(KeeperError::io(
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        let name = source
            .file_name()
            .ok_or_else(|| {
                KeeperError::io(
                    source,
                    io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?
            .to_string_lossy();
        let compress = !self.config.is_precompressed(&name);
        let dest = dest_dir.join(self.output_name(&name));

        fs::create_dir_all(dest_dir).map_err(|e| KeeperError::io(dest_dir, e))?;

        if is_same_file(source, &dest) {
            tracing::debug!(dest = %dest.display(), "source already in place");
            return Ok((dest, metadata.len()));
        }

        let mut temp = temp_file_in(dest_dir)?;
        let mut reader = BufReader::new(File::open(source).map_err(|e| KeeperError::io(source, e))?);

        if compress {
            let mut encoder = GzEncoder::new(
                BufWriter::new(temp.as_file_mut()),
                Compression::new(self.config.level.min(9)),
            );
            io::copy(&mut reader, &mut encoder).map_err(|e| KeeperError::io(source, e))?;
            encoder
                .finish()
                .and_then(|mut writer| writer.flush())
                .map_err(|e| KeeperError::io(&dest, e))?;
        } else {
            io::copy(&mut reader, temp.as_file_mut()).map_err(|e| KeeperError::io(source, e))?;
        }

        self.copy_attributes(&metadata, temp.as_file(), &dest)?;
        temp.persist(&dest)
            .map_err(|e| KeeperError::io(&dest, e.error))?;

        tracing::info!(
            dest = %dest.display(),
            compressed = compress,
            bytes = metadata.len(),
            "normalized file"
        );
        Ok((dest, metadata.len()))
    }

    fn copy_attributes(&self, metadata: &Metadata, file: &File, dest: &Path) -> Result<()> {
        if self.config.preserve_modified {
            let modified = metadata.modified().map_err(|e| KeeperError::io(dest, e))?;
            file.set_modified(modified)
                .map_err(|e| KeeperError::io(dest, e))?;
        }
        file.set_permissions(metadata.permissions())
            .map_err(|e| KeeperError::io(dest, e))
    }
}

/// Gzip `text` into the file at `path`, replacing it atomically.
pub fn write_gzip_text(text: &str, path: impl AsRef<Path>, level: u32) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = temp_file_in(dir)?;
    let mut encoder = GzEncoder::new(
        BufWriter::new(temp.as_file_mut()),
        Compression::new(level.min(9)),
    );
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| KeeperError::io(path, e))?;
    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .map_err(|e| KeeperError::io(path, e))?;

    temp.persist(path)
        .map_err(|e| KeeperError::io(path, e.error))?;
    Ok(())
}

fn temp_file_in(dir: &Path) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".filekeeper-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| KeeperError::io(dir, e))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

//! Filesystem operations for filekeeper.
//!
//! This crate provides the two mutating operations: keep-newest-N retention
//! passes over a folder, and gzip normalization of files into a destination
//! folder. Both are synchronous and report per-file failures instead of
//! stopping at the first one.

mod compress;
mod operation;
mod retention;

pub use compress::{CompressionNormalizer, CompressionReport, GZIP_SUFFIX, write_gzip_text};
pub use operation::{OperationComplete, OperationError, OperationType};
pub use retention::{RetentionManager, RetentionPlan, RetentionReport, enforce};

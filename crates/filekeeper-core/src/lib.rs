//! Core types for filekeeper.
//!
//! This crate provides the pure building blocks used by the other filekeeper
//! crates: path token normalization, file type classification, configuration
//! and error types. Nothing here touches the filesystem except settings
//! loading.

mod config;
mod error;
mod filetype;
mod path;
mod timefmt;

pub use config::{
    CompressionConfig, CompressionConfigBuilder, InventoryConfig, InventoryConfigBuilder,
    PREFIX_DELIMITER_KEY, RetentionConfig, RetentionConfigBuilder, RetentionSettings, Settings,
};
pub use error::{KeeperError, Result, Warning, WarningKind};
pub use filetype::{
    Classification, FILENAME_TIMESTAMP_FORMAT, FileTypeKey, PrefixSource, classify,
    classify_detailed, extension_of, stamped_filename, timestamp_for_filename,
};
pub use path::{
    DISALLOWED, MAX_STRIP_PASSES, StripOutcome, join_under, normalize, normalize_to_string, strip,
    strip_with_limit, tokenize,
};
pub use timefmt::format_elapsed;

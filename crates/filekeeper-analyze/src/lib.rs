//! Folder analysis for filekeeper.
//!
//! Groups the files of a single folder into types keyed by
//! `(prefix, extension)` and answers "which file of this type is newest".
//!
//! ```rust,no_run
//! use filekeeper_analyze::FileTypeInventory;
//!
//! let inventory = FileTypeInventory::with_delimiter("__");
//! let report = inventory.distinct_types("/var/log/exports").unwrap();
//!
//! for key in &report.types {
//!     let newest = inventory.newest_of_type(&report.folder, key).unwrap();
//!     println!("{key}: {}", newest.display());
//! }
//! ```

mod inventory;

pub use inventory::{
    FileEntry, FileTypeInventory, TypeInventory, list_group, sort_oldest_first,
};

// Re-export core types
pub use filekeeper_core::{FileTypeKey, InventoryConfig, Warning, WarningKind};

//! Configuration types.
//!
//! Every operation takes its configuration explicitly. [`Settings`] is the
//! on-disk document (TOML or JSON) those configs are derived from.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, Result};
use crate::filetype::extension_of;

/// Settings key holding the prefix delimiter.
pub const PREFIX_DELIMITER_KEY: &str = "prefix_delimiter";

/// Configuration for a retention pass.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RetentionConfig {
    /// Substring separating a filename's stable prefix from its suffix.
    #[builder(default)]
    #[serde(default)]
    pub prefix_delimiter: String,

    /// Number of newest files to keep per type.
    #[builder(default = "5")]
    #[serde(default = "default_keep")]
    pub keep: usize,

    /// Move files to the OS trash instead of unlinking them.
    #[builder(default = "false")]
    #[serde(default)]
    pub use_trash: bool,
}

fn default_keep() -> usize {
    5
}

impl RetentionConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref delimiter) = self.prefix_delimiter {
            validate_delimiter(delimiter)?;
        }
        Ok(())
    }
}

impl RetentionConfig {
    /// Create a new retention config builder.
    pub fn builder() -> RetentionConfigBuilder {
        RetentionConfigBuilder::default()
    }

    /// Create a config keeping `keep` files, split on `prefix_delimiter`.
    pub fn new(prefix_delimiter: impl Into<String>, keep: usize) -> Self {
        Self {
            prefix_delimiter: prefix_delimiter.into(),
            keep,
            use_trash: false,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self::new("", default_keep())
    }
}

/// Configuration for folder inventories.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct InventoryConfig {
    /// Substring separating a filename's stable prefix from its suffix.
    #[builder(default)]
    #[serde(default)]
    pub prefix_delimiter: String,

    /// Glob patterns for entries to leave out of the inventory.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

impl InventoryConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref delimiter) = self.prefix_delimiter {
            validate_delimiter(delimiter)?;
        }
        Ok(())
    }
}

impl InventoryConfig {
    /// Create a new inventory config builder.
    pub fn builder() -> InventoryConfigBuilder {
        InventoryConfigBuilder::default()
    }

    /// Create a config with only a delimiter.
    pub fn new(prefix_delimiter: impl Into<String>) -> Self {
        Self {
            prefix_delimiter: prefix_delimiter.into(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Configuration for compression normalization.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct CompressionConfig {
    /// Gzip level, 0 (store) to 9 (best).
    #[builder(default = "6")]
    #[serde(default = "default_level")]
    pub level: u32,

    /// Copy the source modification time onto the output.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_modified: bool,

    /// Extensions treated as already compressed and copied verbatim.
    #[builder(default = "default_precompressed()")]
    #[serde(default = "default_precompressed")]
    pub precompressed_extensions: Vec<String>,
}

fn default_level() -> u32 {
    6
}

fn default_true() -> bool {
    true
}

fn default_precompressed() -> Vec<String> {
    vec![".gz".to_string(), ".zip".to_string()]
}

impl CompressionConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(level) = self.level {
            if level > 9 {
                return Err(format!("Gzip level must be 0-9, got {level}"));
            }
        }
        Ok(())
    }
}

impl CompressionConfig {
    /// Create a new compression config builder.
    pub fn builder() -> CompressionConfigBuilder {
        CompressionConfigBuilder::default()
    }

    /// Check if `filename` already carries a compressed extension.
    pub fn is_precompressed(&self, filename: &str) -> bool {
        let extension = extension_of(filename);
        !extension.is_empty()
            && self
                .precompressed_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            preserve_modified: true,
            precompressed_extensions: default_precompressed(),
        }
    }
}

fn validate_delimiter(delimiter: &str) -> std::result::Result<(), String> {
    if delimiter.contains(['/', '\\']) {
        return Err(format!(
            "Prefix delimiter cannot contain a path separator: {delimiter:?}"
        ));
    }
    Ok(())
}

/// The settings document shared by every filekeeper operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Substring separating a filename's stable prefix from its suffix.
    #[serde(default)]
    pub prefix_delimiter: Option<String>,

    /// Retention settings.
    #[serde(default)]
    pub retention: RetentionSettings,

    /// Compression settings.
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Glob patterns excluded from inventories.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Retention section of [`Settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Number of newest files to keep per type.
    #[serde(default = "default_keep")]
    pub keep: usize,

    /// Move files to the OS trash instead of unlinking them.
    #[serde(default)]
    pub use_trash: bool,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            keep: default_keep(),
            use_trash: false,
        }
    }
}

impl Settings {
    /// Default settings file location (`<config dir>/filekeeper/settings.toml`).
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("filekeeper")
            .join("settings.toml")
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| KeeperError::io(path, e))?;
        let config_error = |message: String| KeeperError::Config {
            path: path.to_path_buf(),
            message,
        };

        let settings: Settings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?,
            _ => toml::from_str(&text).map_err(|e| config_error(e.to_string()))?,
        };
        settings.validate().map_err(config_error)?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load from the default location, falling back to defaults if it is absent.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured delimiter, or the empty string when absent.
    pub fn prefix_delimiter(&self) -> &str {
        self.prefix_delimiter.as_deref().unwrap_or("")
    }

    /// The configured delimiter, failing when absent or empty.
    ///
    /// Classification still works without it (dot fallback), so callers
    /// should treat the error as a warning.
    pub fn require_prefix_delimiter(&self) -> Result<&str> {
        match self.prefix_delimiter() {
            "" => Err(KeeperError::ConfigurationMissing {
                key: PREFIX_DELIMITER_KEY.to_string(),
            }),
            delimiter => Ok(delimiter),
        }
    }

    /// Replace the prefix delimiter, rejecting one containing a path separator.
    pub fn set_prefix_delimiter(&mut self, delimiter: impl Into<String>) -> Result<()> {
        let delimiter = delimiter.into();
        validate_delimiter(&delimiter).map_err(|message| KeeperError::InvalidConfig { message })?;
        self.prefix_delimiter = Some(delimiter);
        Ok(())
    }

    /// Derive the retention config.
    pub fn retention_config(&self) -> RetentionConfig {
        RetentionConfig {
            prefix_delimiter: self.prefix_delimiter().to_string(),
            keep: self.retention.keep,
            use_trash: self.retention.use_trash,
        }
    }

    /// Derive the inventory config.
    pub fn inventory_config(&self) -> InventoryConfig {
        InventoryConfig {
            prefix_delimiter: self.prefix_delimiter().to_string(),
            exclude_patterns: self.exclude_patterns.clone(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        validate_delimiter(self.prefix_delimiter())?;
        if self.compression.level > 9 {
            return Err(format!(
                "Gzip level must be 0-9, got {}",
                self.compression.level
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_builder() {
        let config = RetentionConfig::builder()
            .prefix_delimiter("__")
            .keep(3usize)
            .build()
            .unwrap();

        assert_eq!(config.prefix_delimiter, "__");
        assert_eq!(config.keep, 3);
        assert!(!config.use_trash);
    }

    #[test]
    fn test_retention_builder_rejects_separator() {
        let result = RetentionConfig::builder().prefix_delimiter("a/b").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_compression_builder_rejects_level() {
        assert!(CompressionConfig::builder().level(10u32).build().is_err());
        assert_eq!(CompressionConfig::builder().build().unwrap().level, 6);
    }

    #[test]
    fn test_is_precompressed() {
        let config = CompressionConfig::default();
        assert!(config.is_precompressed("a.gz"));
        assert!(config.is_precompressed("A.ZIP"));
        assert!(config.is_precompressed("log.txt.gz"));
        assert!(!config.is_precompressed("a.gzip"));
        assert!(!config.is_precompressed("gz"));
        assert!(!config.is_precompressed("a.txt"));
    }

    #[test]
    fn test_require_prefix_delimiter() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.require_prefix_delimiter(),
            Err(KeeperError::ConfigurationMissing { .. })
        ));

        settings.prefix_delimiter = Some(String::new());
        assert!(settings.require_prefix_delimiter().is_err());

        settings.prefix_delimiter = Some("__".into());
        assert_eq!(settings.require_prefix_delimiter().unwrap(), "__");
    }

    #[test]
    fn test_set_prefix_delimiter_validates() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_prefix_delimiter("a/b"),
            Err(KeeperError::InvalidConfig { .. })
        ));
        assert!(settings.set_prefix_delimiter("x\\y").is_err());
        assert_eq!(settings.prefix_delimiter, None);

        settings.set_prefix_delimiter("__").unwrap();
        assert_eq!(settings.prefix_delimiter(), "__");
    }

    #[test]
    fn test_derived_configs() {
        let settings = Settings {
            prefix_delimiter: Some("_20".into()),
            exclude_patterns: vec!["*.tmp".into()],
            ..Default::default()
        };

        let retention = settings.retention_config();
        assert_eq!(retention.prefix_delimiter, "_20");
        assert_eq!(retention.keep, 5);

        let inventory = settings.inventory_config();
        assert_eq!(inventory.exclude_patterns, vec!["*.tmp".to_string()]);
    }
}

//! File type classification.
//!
//! Filenames in a retention folder usually follow `<name><delimiter><stamp>.<ext>`.
//! A [`FileTypeKey`] captures the stable `(prefix, extension)` part so that
//! successive snapshots of the same series group together.

use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// `strftime` format of the timestamp appended to generated filenames.
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%H_%M__%m_%d_%Y";

/// The `(prefix, extension)` pair identifying a series of files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileTypeKey {
    /// Stable leading part of the filename.
    pub prefix: String,
    /// `.` plus the text after the last dot, or empty.
    pub extension: String,
}

impl FileTypeKey {
    /// Create a new key.
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// Check whether `name` belongs to this type.
    ///
    /// Equivalent to matching the glob `{prefix}*{extension}`, without any
    /// wildcard interpretation of the prefix. Dotfiles only match when the
    /// prefix itself starts with a dot.
    pub fn matches(&self, name: &str) -> bool {
        if name.starts_with('.') && !self.prefix.starts_with('.') {
            return false;
        }
        name.len() >= self.prefix.len() + self.extension.len()
            && name.starts_with(&self.prefix)
            && name[self.prefix.len()..].ends_with(&self.extension)
    }

    /// The glob pattern equivalent to [`matches`](Self::matches), for display.
    pub fn pattern(&self) -> String {
        format!("{}*{}", self.prefix, self.extension)
    }
}

impl fmt::Display for FileTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// Which rule produced a key's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixSource {
    /// Text before the configured delimiter.
    Delimiter,
    /// Delimiter absent; text before the first dot.
    FirstDot,
    /// Delimiter and dot absent; the whole filename.
    WholeName,
}

impl PrefixSource {
    /// Whether the delimiter rule did not apply.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Delimiter)
    }
}

/// A key together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub key: FileTypeKey,
    pub source: PrefixSource,
}

/// Classify `filename`, reporting which prefix rule applied.
///
/// Never fails: missing delimiters fall back to the first dot, and names
/// without a dot become their own prefix with an empty extension.
pub fn classify_detailed(filename: &str, delimiter: &str) -> Classification {
    let (prefix, source) = match (!delimiter.is_empty())
        .then(|| filename.split_once(delimiter))
        .flatten()
    {
        Some((head, _)) => (head, PrefixSource::Delimiter),
        None => match filename.split_once('.') {
            Some((head, _)) => (head, PrefixSource::FirstDot),
            None => (filename, PrefixSource::WholeName),
        },
    };

    let extension = match filename.rsplit_once('.') {
        Some((_, tail)) => format!(".{tail}"),
        None => String::new(),
    };

    Classification {
        key: FileTypeKey::new(prefix, extension),
        source,
    }
}

/// Classify `filename` into its [`FileTypeKey`].
///
/// ```
/// use filekeeper_core::{classify, FileTypeKey};
///
/// assert_eq!(
///     classify("report_2024_01_05.json", "_2024"),
///     FileTypeKey::new("report", ".json"),
/// );
/// assert_eq!(classify("README", "_NOPE"), FileTypeKey::new("README", ""));
/// ```
pub fn classify(filename: &str, delimiter: &str) -> FileTypeKey {
    let classification = classify_detailed(filename, delimiter);
    if classification.source.is_fallback() {
        tracing::debug!(
            filename,
            delimiter,
            prefix = %classification.key.prefix,
            "delimiter not found, using fallback prefix"
        );
    }
    classification.key
}

/// The extension [`classify`] would assign to `filename`.
pub fn extension_of(filename: &str) -> &str {
    filename.rfind('.').map_or("", |idx| &filename[idx..])
}

/// Render `time` in the filename timestamp format.
pub fn timestamp_for_filename<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format(FILENAME_TIMESTAMP_FORMAT).to_string()
}

/// Build `<prefix><delimiter><timestamp><extension>`.
///
/// The result classifies back to `(prefix, extension)` as long as `prefix`
/// does not itself contain `delimiter`.
pub fn stamped_filename<Tz: TimeZone>(
    prefix: &str,
    delimiter: &str,
    time: &DateTime<Tz>,
    extension: &str,
) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{prefix}{delimiter}{}{extension}",
        timestamp_for_filename(time)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_classify_with_delimiter() {
        let c = classify_detailed("report_2024_01_05.json", "_2024");
        assert_eq!(c.key, FileTypeKey::new("report", ".json"));
        assert_eq!(c.source, PrefixSource::Delimiter);
    }

    #[test]
    fn test_classify_dot_fallback() {
        let c = classify_detailed("report.json", "_NOPE");
        assert_eq!(c.key, FileTypeKey::new("report", ".json"));
        assert_eq!(c.source, PrefixSource::FirstDot);
        assert!(c.source.is_fallback());
    }

    #[test]
    fn test_classify_whole_name() {
        let c = classify_detailed("README", "_NOPE");
        assert_eq!(c.key, FileTypeKey::new("README", ""));
        assert_eq!(c.source, PrefixSource::WholeName);
    }

    #[test]
    fn test_classify_empty_delimiter_uses_dot() {
        let c = classify_detailed("app_2024.log", "");
        assert_eq!(c.key, FileTypeKey::new("app_2024", ".log"));
        assert_eq!(c.source, PrefixSource::FirstDot);
    }

    #[test]
    fn test_classify_multi_dot_fallback() {
        // Fallback splits on the first dot; extension comes from the last one.
        let key = classify("v1.2.3_build.tar.gz", "__");
        assert_eq!(key, FileTypeKey::new("v1", ".gz"));
    }

    #[test]
    fn test_classify_series_shares_key() {
        let a = classify("metrics__10_30__01_02_2024.csv", "__");
        let b = classify("metrics__11_45__03_04_2024.csv", "__");
        assert_eq!(a, b);
        assert_eq!(a, FileTypeKey::new("metrics", ".csv"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.tar.gz"), ".gz");
        assert_eq!(extension_of("file."), ".");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn test_matches() {
        let key = FileTypeKey::new("a", ".log");
        assert!(key.matches("a_2024_01_01.log"));
        assert!(key.matches("a.log"));
        assert!(key.matches("abc.log"));
        assert!(!key.matches("a_2024.txt"));
        assert!(!key.matches("b_2024.log"));
        // Prefix and extension may not overlap.
        assert!(!FileTypeKey::new("a.l", ".log").matches("a.log"));
    }

    #[test]
    fn test_matches_wildcard_chars_are_literal() {
        let key = FileTypeKey::new("data[1]", ".csv");
        assert!(key.matches("data[1]_2024.csv"));
        assert!(!key.matches("data1_2024.csv"));

        let key = FileTypeKey::new("*", "");
        assert!(!key.matches("anything"));
        assert!(key.matches("*star"));
    }

    #[test]
    fn test_matches_skips_dotfiles() {
        let key = FileTypeKey::new("", ".log");
        assert!(key.matches("x.log"));
        assert!(!key.matches(".hidden.log"));
        assert!(FileTypeKey::new(".cache", "").matches(".cache_1"));
    }

    #[test]
    fn test_pattern_display() {
        let key = FileTypeKey::new("report", ".json");
        assert_eq!(key.pattern(), "report*.json");
        assert_eq!(key.to_string(), "report*.json");
    }

    #[test]
    fn test_stamped_filename_round_trips_key() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap();
        let name = stamped_filename("backup", "__", &time, ".tar");
        assert_eq!(name, "backup__07_05__03_09_2024.tar");
        assert_eq!(classify(&name, "__"), FileTypeKey::new("backup", ".tar"));
    }
}

use filekeeper_core::{
    FileTypeKey, KeeperError, MAX_STRIP_PASSES, Settings, classify, normalize, strip,
    strip_with_limit, tokenize,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_strip_padded_core_within_budget() {
    let junk = ["~", ".", "$", "@", " ", "\\", "|"];
    for depth in 1..=4 {
        let pad: String = junk.iter().cycle().take(depth * 2).copied().collect();
        let padded = format!("{pad}core-01{pad}");
        assert_eq!(strip(&padded), "core-01", "input: {padded:?}");
        assert!(strip_with_limit(&padded, MAX_STRIP_PASSES).converged);
    }
}

#[test]
fn test_tokenize_and_normalize_documented_examples() {
    assert_eq!(tokenize("..dir\\.dir/file."), vec!["..dir", ".dir", "file."]);
    assert_eq!(normalize(".dir\\dir./file.."), vec!["dir", "dir", "file"]);
}

#[test]
fn test_classification_properties() {
    assert_eq!(
        classify("report_2024_01_05.json", "_2024"),
        FileTypeKey::new("report", ".json")
    );
    assert_eq!(
        classify("report.json", "_NOPE"),
        FileTypeKey::new("report", ".json")
    );
    assert_eq!(classify("README", "_NOPE"), FileTypeKey::new("README", ""));
}

#[test]
fn test_settings_load_toml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(
        &path,
        r#"
prefix_delimiter = "__"
exclude_patterns = ["*.tmp"]

[retention]
keep = 3

[compression]
level = 9
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.prefix_delimiter(), "__");
    assert_eq!(settings.retention.keep, 3);
    assert!(!settings.retention.use_trash);
    assert_eq!(settings.compression.level, 9);
    assert!(settings.compression.preserve_modified);
    assert_eq!(settings.compression.precompressed_extensions, vec![".gz", ".zip"]);
    assert_eq!(settings.exclude_patterns, vec!["*.tmp"]);
}

#[test]
fn test_settings_load_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, r#"{ "prefix_delimiter": "_20", "retention": { "keep": 1 } }"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.retention_config().prefix_delimiter, "_20");
    assert_eq!(settings.retention_config().keep, 1);
}

#[test]
fn test_settings_missing_delimiter_degrades() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(&path, "[retention]\nkeep = 2\n").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.prefix_delimiter(), "");
    let err = settings.require_prefix_delimiter().unwrap_err();
    assert!(err.is_warning());
}

#[test]
fn test_settings_invalid_documents() {
    let temp = TempDir::new().unwrap();

    let bad_level = temp.path().join("level.toml");
    fs::write(&bad_level, "[compression]\nlevel = 12\n").unwrap();
    assert!(matches!(
        Settings::load(&bad_level),
        Err(KeeperError::Config { .. })
    ));

    let unknown = temp.path().join("unknown.toml");
    fs::write(&unknown, "prefix_delimeter = \"__\"\n").unwrap();
    assert!(matches!(
        Settings::load(&unknown),
        Err(KeeperError::Config { .. })
    ));

    let missing = temp.path().join("missing.toml");
    assert!(matches!(Settings::load(&missing), Err(KeeperError::Io { .. })));
}

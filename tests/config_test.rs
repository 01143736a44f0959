//! 設定ファイルのテスト

use receipt_review::config::Config;
use tempfile::tempdir;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.api_base, "http://localhost:8000");
    assert_eq!(config.health_attempts, 10);
    assert_eq!(config.health_interval_ms, 500);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        api_base: "http://192.168.1.20:8000".into(),
        timeout_seconds: 30,
        ..Config::default()
    };
    config.save_to(&path).expect("設定の保存に失敗");

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

/// 欠けた項目は既定値で補う
#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"api_base": "http://backend:8000"}"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api_base, "http://backend:8000");
    assert_eq!(config.timeout_seconds, 120);
}

#[test]
fn test_broken_file_is_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ broken").unwrap();

    assert!(Config::load_from(&path).is_err());
}

//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use receipt_review::error::ReceiptError;
use receipt_review::scanner;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert!(matches!(err, ReceiptError::FolderNotFound(_)));
}

/// 存在しないファイルを指定した場合
#[test]
fn test_collect_nonexistent_file() {
    let result = scanner::collect_images(&[PathBuf::from("/nonexistent/receipt.jpg")]);
    assert!(matches!(result, Err(ReceiptError::FileNotFound(_))));
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");

    // テキストファイルのみ作成
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path());
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// ReceiptErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ReceiptError::Config("テスト設定エラー".to_string()),
        ReceiptError::FileNotFound("test.jpg".to_string()),
        ReceiptError::FolderNotFound("/path/to/folder".to_string()),
        ReceiptError::NoImagesFound("フォルダ".to_string()),
        ReceiptError::BackendUnreachable("http://localhost:8000".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: ReceiptError = io_err.into();

    assert!(matches!(err, ReceiptError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: ReceiptError = json_err.into();

    assert!(matches!(err, ReceiptError::JsonParse(_)));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_transparent() {
    let common_err = receipt_review_common::Error::from_response(
        409,
        Some(serde_json::json!({"detail": "already saved"})),
    );
    let err: ReceiptError = common_err.into();

    assert!(matches!(err, ReceiptError::Common(_)));
    let display = format!("{}", err);
    assert!(display.contains("409"));
    assert!(display.contains("already saved"));
}

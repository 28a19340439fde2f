//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use device_twin::acquire;
use device_twin::error::{DeviceTwinError, ErrorKind};
use std::path::Path;
use tempfile::tempdir;

/// 存在しない画像を読み込んだ場合
#[test]
fn test_load_nonexistent_image() {
    let result = acquire::load_image(Path::new("/nonexistent/path/washer.jpg"), 2048, None);
    assert!(matches!(result, Err(DeviceTwinError::FileNotFound(_))));
}

/// ディレクトリを画像として渡した場合
#[test]
fn test_load_directory_as_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = acquire::load_image(dir.path(), 2048, None);
    assert!(matches!(result, Err(DeviceTwinError::FileNotFound(_))));
}

/// 画像でないファイルを読み込んだ場合
#[test]
fn test_load_non_image_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("notes.jpg");
    std::fs::write(&path, "hello").unwrap();

    let err = acquire::load_image(&path, 2048, None).unwrap_err();
    assert!(matches!(err, DeviceTwinError::ImageLoad(_)));
    assert_eq!(err.kind(), ErrorKind::Local);
}

/// DeviceTwinErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        DeviceTwinError::Config("bad temperature".to_string()),
        DeviceTwinError::MissingApiKey,
        DeviceTwinError::FileNotFound("washer.jpg".to_string()),
        DeviceTwinError::ImageLoad("truncated".to_string()),
        DeviceTwinError::ApiCall("connection reset".to_string()),
        DeviceTwinError::ApiStatus { status: 503, body: "overloaded".to_string() },
        DeviceTwinError::EmptyResponse,
        DeviceTwinError::Cache("no cache dir".to_string()),
        DeviceTwinError::Prompt("not a terminal".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// MissingApiKeyエラーのメッセージ確認
#[test]
fn test_missing_api_key_message() {
    let display = DeviceTwinError::MissingApiKey.to_string();

    assert!(display.contains("GEMINI_API_KEY"));
    assert!(display.contains("device-twin config"));
}

/// ステータスエラーのメッセージ
#[test]
fn test_api_status_message() {
    let err = DeviceTwinError::ApiStatus { status: 429, body: "quota".to_string() };
    let display = err.to_string();
    assert!(display.contains("429"));
    assert!(display.contains("quota"));
}

/// エラーの分類
#[test]
fn test_error_kinds() {
    assert_eq!(DeviceTwinError::ApiCall("x".into()).kind(), ErrorKind::Transient);
    assert_eq!(
        DeviceTwinError::ApiStatus { status: 500, body: String::new() }.kind(),
        ErrorKind::Transient
    );
    assert_eq!(DeviceTwinError::EmptyResponse.kind(), ErrorKind::Transient);

    let invalid: DeviceTwinError =
        device_twin_common::Error::Validation("controls[0].id is empty".into()).into();
    assert_eq!(invalid.kind(), ErrorKind::InvalidResponse);

    assert_eq!(DeviceTwinError::MissingApiKey.kind(), ErrorKind::Local);
    assert_eq!(DeviceTwinError::Config("x".into()).kind(), ErrorKind::Local);
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: DeviceTwinError = io_err.into();

    assert!(matches!(err, DeviceTwinError::Io(_)));
    assert!(err.to_string().contains("IO"));
    assert_eq!(err.kind(), ErrorKind::Local);
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: DeviceTwinError = json_err.into();

    assert!(matches!(err, DeviceTwinError::JsonParse(_)));
}

/// common::Errorからの変換
#[test]
fn test_common_error_conversion() {
    let common_err = device_twin_common::Error::Parse("no JSON object found".to_string());
    let err: DeviceTwinError = common_err.into();

    assert!(matches!(err, DeviceTwinError::InvalidResponse(_)));
    assert!(err.to_string().contains("no JSON object found"));
}

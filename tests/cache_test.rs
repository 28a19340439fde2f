//! キャッシュ機能テスト
//!
//! 解析結果キャッシュの動作を検証

use device_twin::analyzer::CacheFile;
use device_twin_common::{ControlCategory, ControlType, DeviceAnalysis, DeviceControl};
use tempfile::tempdir;

fn thermostat() -> DeviceAnalysis {
    DeviceAnalysis {
        device_name: "Thermostat".to_string(),
        summary: "Wall mounted thermostat".to_string(),
        safety_warning: None,
        controls: vec![DeviceControl {
            id: "1".to_string(),
            label: "Temperature Dial".to_string(),
            control_type: ControlType::Knob,
            description: "Center of the unit".to_string(),
            category: ControlCategory::Primary,
            detail_text: "Turn clockwise to warm.".to_string(),
        }],
    }
}

/// 空のキャッシュファイル
#[test]
fn test_cache_file_empty() {
    let dir = tempdir().expect("Failed to create temp dir");
    let cache = CacheFile::load(dir.path());

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
}

/// キャッシュの保存と読み込み
#[test]
fn test_cache_save_and_load() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut cache = CacheFile::load(dir.path());
    cache.insert(
        "abc123".to_string(),
        "thermostat.jpg".to_string(),
        "gemini-2.5-flash".to_string(),
        thermostat(),
    );
    cache.save(dir.path()).expect("キャッシュ保存失敗");

    let loaded = CacheFile::load(dir.path());
    assert_eq!(loaded.len(), 1);

    let cached = loaded.get("abc123").expect("キャッシュが見つからない");
    assert_eq!(cached, thermostat());

    let entry = loaded.entries().next().unwrap();
    assert_eq!(entry.source, "thermostat.jpg");
    assert_eq!(entry.model, "gemini-2.5-flash");
    assert!(chrono::DateTime::parse_from_rfc3339(&entry.cached_at).is_ok());
}

/// キャッシュミス
#[test]
fn test_cache_miss() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = CacheFile::load(dir.path());
    cache.insert("known".to_string(), "a.jpg".to_string(), "m".to_string(), thermostat());

    assert!(cache.get("unknown").is_none());
}

/// 同じキーは上書き
#[test]
fn test_cache_insert_overwrites() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut cache = CacheFile::load(dir.path());

    cache.insert("k".to_string(), "a.jpg".to_string(), "m".to_string(), thermostat());
    let mut updated = thermostat();
    updated.summary = "Updated".to_string();
    cache.insert("k".to_string(), "a.jpg".to_string(), "m".to_string(), updated);

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("k").unwrap().summary, "Updated");
}

/// 壊れたキャッシュファイルは空として扱う
#[test]
fn test_corrupted_cache_starts_fresh() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(CacheFile::cache_path(dir.path()), "{ not json").unwrap();

    let cache = CacheFile::load(dir.path());
    assert!(cache.is_empty());
}

/// バージョン違いは空として扱う
#[test]
fn test_version_mismatch_starts_fresh() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        CacheFile::cache_path(dir.path()),
        r#"{"version": 999, "entries": {}}"#,
    )
    .unwrap();

    let cache = CacheFile::load(dir.path());
    assert!(cache.is_empty());
}

/// キャッシュ削除
#[test]
fn test_cache_clear() {
    let dir = tempdir().expect("Failed to create temp dir");

    let mut cache = CacheFile::load(dir.path());
    cache.insert("k".to_string(), "a.jpg".to_string(), "m".to_string(), thermostat());
    cache.save(dir.path()).unwrap();
    assert!(CacheFile::cache_path(dir.path()).exists());

    assert!(CacheFile::clear(dir.path()).unwrap());
    assert!(!CacheFile::cache_path(dir.path()).exists());

    // 2回目は削除対象なし
    assert!(!CacheFile::clear(dir.path()).unwrap());
}

/// 存在しないディレクトリにも保存できる
#[test]
fn test_save_creates_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("nested").join("cache");

    let mut cache = CacheFile::load(&nested);
    cache.insert("k".to_string(), "a.jpg".to_string(), "m".to_string(), thermostat());
    cache.save(&nested).expect("キャッシュ保存失敗");

    assert_eq!(CacheFile::load(&nested).len(), 1);
}

/// 手で編集されて検証に通らないエントリはミス扱い
#[test]
fn test_invalid_entry_is_a_miss() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(
        CacheFile::cache_path(dir.path()),
        r#"{
            "version": 1,
            "entries": {
                "edited": {
                    "source": "thermostat.jpg",
                    "model": "gemini-2.5-flash",
                    "cached_at": "2026-01-01T00:00:00+00:00",
                    "analysis": {
                        "deviceName": "Thermostat",
                        "summary": "Wall mounted thermostat",
                        "controls": [
                            {"id": "1", "label": "  ", "type": "KNOB", "description": "Center",
                             "category": "PRIMARY", "detailText": "Turn."}
                        ]
                    }
                }
            }
        }"#,
    )
    .unwrap();

    let cache = CacheFile::load(dir.path());
    assert_eq!(cache.len(), 1);
    assert!(cache.get("edited").is_none());
}

/// 読み出し時に空白だけの警告は取り除かれる
#[test]
fn test_cached_entry_is_normalized() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut analysis = thermostat();
    analysis.safety_warning = Some("   ".to_string());

    let mut cache = CacheFile::load(dir.path());
    cache.insert("k".to_string(), "a.jpg".to_string(), "m".to_string(), analysis);

    assert_eq!(cache.get("k").unwrap().safety_warning, None);
}

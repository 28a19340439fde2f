//! 解析結果キャッシュモジュール
//!
//! 画像のSHA-256・送信時のMIMEタイプと縮小サイズ・モデル名・プロンプトバージョンを
//! キーにして解析結果を保存し、同じ画像の再解析をスキップする。
//! 読み出した結果はバックエンドの応答と同じ検証を通す。

use crate::error::{DeviceTwinError, Result};
use device_twin_common::{validate_analysis, DeviceAnalysis, PROMPT_VERSION};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

const CACHE_FILE_NAME: &str = "analyses.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// キャッシュキー → 解析結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// 元画像のファイル名
    pub source: String,
    pub model: String,
    /// 保存日時（RFC 3339）
    pub cached_at: String,
    pub analysis: DeviceAnalysis,
}

impl CacheFile {
    const CURRENT_VERSION: u32 = 1;

    /// 既定のキャッシュディレクトリ
    pub fn default_dir() -> Result<PathBuf> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| DeviceTwinError::Cache("cache directory not found".into()))?;
        Ok(dir.join("device-twin"))
    }

    pub fn cache_path(dir: &Path) -> PathBuf {
        dir.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み
    ///
    /// 存在しない・壊れている・バージョン違いの場合は空で返す
    pub fn load(dir: &Path) -> Self {
        let cache_path = Self::cache_path(dir);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(e) => {
                warn!(path = %cache_path.display(), error = %e, "failed to open cache");
                return Self::default();
            }
        };

        match serde_json::from_reader::<_, CacheFile>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(cache) => {
                warn!(
                    found = cache.version,
                    expected = Self::CURRENT_VERSION,
                    "cache version mismatch, starting fresh"
                );
                Self::default()
            }
            Err(e) => {
                warn!(
                    path = %cache_path.display(),
                    error = %e,
                    "cache file is corrupted, starting fresh"
                );
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let file = File::create(Self::cache_path(dir))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在した場合 true）
    pub fn clear(dir: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(dir);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// 検証済みの解析結果を取得
    ///
    /// 手で編集されるなどして検証に通らないエントリはミス扱い
    pub fn get(&self, key: &str) -> Option<DeviceAnalysis> {
        let entry = self.entries.get(key)?;
        match validate_analysis(entry.analysis.clone()) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!(key, source = %entry.source, error = %e, "ignoring invalid cache entry");
                None
            }
        }
    }

    pub fn insert(&mut self, key: String, source: String, model: String, analysis: DeviceAnalysis) {
        self.entries.insert(
            key,
            CacheEntry {
                source,
                model,
                cached_at: chrono::Local::now().to_rfc3339(),
                analysis,
            },
        );
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// キャッシュキーを計算
///
/// 送る内容（MIMEタイプ・縮小サイズ）やプロンプト・モデルが変われば別キーになる
pub fn cache_key(image_sha256: &str, mime_type: &str, max_image_size: u32, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_sha256.as_bytes());
    hasher.update(format!(":{}:{}:", mime_type, max_image_size).as_bytes());
    hasher.update(model.as_bytes());
    hasher.update(format!(":v{}", PROMPT_VERSION).as_bytes());
    hex::encode(hasher.finalize())
}

use crate::analyzer::RetryPolicy;
use crate::error::{DeviceTwinError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// APIキーを読む環境変数（先頭を優先）
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    /// 長辺がこれを超える画像は縮小して送る（0で無効）
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    /// スキーマ違反のレスポンスも再試行するか
    pub retry_invalid_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            max_image_size: 2048,
            timeout_seconds: 60,
            temperature: 0.1,
            max_attempts: 3,
            base_delay_ms: 1000,
            retry_invalid_responses: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DeviceTwinError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("device-twin").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(DeviceTwinError::Config("model must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(DeviceTwinError::Config("max_attempts must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DeviceTwinError::Config(format!(
                "temperature {} is out of range 0.0-2.0",
                self.temperature
            )));
        }
        Ok(())
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        for var in API_KEY_ENV_VARS {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    return Ok(key);
                }
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DeviceTwinError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.model = model;
        self.validate()?;
        self.save()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            retry_invalid_responses: self.retry_invalid_responses,
        }
    }
}

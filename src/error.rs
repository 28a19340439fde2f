use thiserror::Error;

/// エラーの分類（リトライ判定に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 通信エラー・空レスポンスなど。再試行すれば成功しうる
    Transient,
    /// バックエンドの出力がJSONとして不正、またはスキーマ違反
    InvalidResponse,
    /// 設定・ファイルなど手元の問題。再試行しない
    Local,
}

#[derive(Error, Debug)]
pub enum DeviceTwinError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No API key configured. Set GEMINI_API_KEY or run `device-twin config --set-api-key YOUR_KEY`")]
    MissingApiKey,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not load image: {0}")]
    ImageLoad(String),

    #[error("API call failed: {0}")]
    ApiCall(String),

    #[error("API returned status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("API returned an empty response")]
    EmptyResponse,

    #[error("Invalid analysis response: {0}")]
    InvalidResponse(#[from] device_twin_common::Error),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl DeviceTwinError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeviceTwinError::ApiCall(_)
            | DeviceTwinError::ApiStatus { .. }
            | DeviceTwinError::EmptyResponse => ErrorKind::Transient,
            DeviceTwinError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            _ => ErrorKind::Local,
        }
    }
}

impl From<reqwest::Error> for DeviceTwinError {
    fn from(e: reqwest::Error) -> Self {
        // メッセージにURLを含めない
        DeviceTwinError::ApiCall(e.without_url().to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeviceTwinError>;

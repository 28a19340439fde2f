//! バックエンド抽象
//!
//! 解析クライアントはこのトレイト越しにだけバックエンドを呼ぶ。
//! 実装は Gemini API クライアントとテスト用モック。

use crate::error::Result;
use async_trait::async_trait;
use device_twin_common::{analysis_schema, build_analysis_prompt};
use serde_json::Value;
use std::sync::Arc;

/// MIMEタイプ未指定時の既定値
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// 既定のサンプリング温度（構造化出力の安定性を優先）
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// 1回の試行で送る内容
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Base64エンコード済み画像
    pub image_data: String,
    pub mime_type: String,
    pub prompt: String,
    pub response_schema: Value,
    pub temperature: f32,
}

impl AnalysisRequest {
    pub fn new(image_data: &str, mime_type: &str, temperature: f32) -> Self {
        let mime_type = if mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Self {
            image_data: image_data.to_string(),
            mime_type: mime_type.to_string(),
            prompt: build_analysis_prompt(),
            response_schema: analysis_schema(),
            temperature,
        }
    }
}

/// 画像を受け取り、生のレスポンステキストを返すバックエンド
#[async_trait]
pub trait VisionBackend: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String>;
}

#[async_trait]
impl<T: VisionBackend + ?Sized> VisionBackend for Arc<T> {
    async fn generate(&self, request: &AnalysisRequest) -> Result<String> {
        (**self).generate(request).await
    }
}

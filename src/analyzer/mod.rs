//! 解析クライアント
//!
//! Base64画像とMIMEタイプを受け取り、バックエンドに構造化出力を要求し、
//! 検証済みの DeviceAnalysis を返す。失敗は RetryPolicy に従って再試行する。
//! 結果は全部か無しか。部分的な解析結果は返さない。

mod backend;
pub mod cache;
mod gemini;
mod retry;

pub use backend::{AnalysisRequest, VisionBackend, DEFAULT_MIME_TYPE, DEFAULT_TEMPERATURE};
pub use cache::{cache_key, CacheFile};
pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, RetryState};

use crate::error::{DeviceTwinError, Result};
use device_twin_common::{parse_analysis_response, DeviceAnalysis};
use tracing::{info, warn};

pub struct Analyzer<B> {
    backend: B,
    policy: RetryPolicy,
    temperature: f32,
}

impl<B: VisionBackend> Analyzer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// 画像を解析
    ///
    /// # Arguments
    /// * `image_data` - Base64エンコード済み画像
    /// * `mime_type` - 画像のMIMEタイプ（空なら image/jpeg）
    pub async fn analyze(&self, image_data: &str, mime_type: &str) -> Result<DeviceAnalysis> {
        self.analyze_with_progress(image_data, mime_type, |_| {}).await
    }

    /// 画像を解析（状態遷移を通知）
    ///
    /// 同時に複数呼んでもそれぞれ独立に再試行する
    pub async fn analyze_with_progress(
        &self,
        image_data: &str,
        mime_type: &str,
        on_state: impl Fn(RetryState),
    ) -> Result<DeviceAnalysis> {
        let request = AnalysisRequest::new(image_data, mime_type, self.temperature);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            on_state(RetryState::Attempting {
                attempt: attempt + 1,
                max_attempts,
            });

            match self.attempt_once(&request).await {
                Ok(analysis) => {
                    attempt += 1;
                    info!(
                        attempt,
                        device = %analysis.device_name,
                        controls = analysis.controls.len(),
                        "device analysis succeeded"
                    );
                    on_state(RetryState::Succeeded { attempts: attempt });
                    return Ok(analysis);
                }
                Err(e) => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_attempts,
                        kind = ?e.kind(),
                        error = %e,
                        "device analysis attempt failed"
                    );

                    if attempt >= max_attempts || !self.policy.is_retryable(&e) {
                        on_state(RetryState::Failed { attempts: attempt });
                        return Err(e);
                    }

                    let delay = self.policy.delay_for(attempt);
                    on_state(RetryState::Backoff { attempt, delay });
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt_once(&self, request: &AnalysisRequest) -> Result<DeviceAnalysis> {
        let text = self.backend.generate(request).await?;
        if text.trim().is_empty() {
            return Err(DeviceTwinError::EmptyResponse);
        }
        Ok(parse_analysis_response(&text)?)
    }
}

//! リトライポリシー
//!
//! 状態遷移: Attempting → (Succeeded | Backoff → Attempting | Failed)
//! 待ち時間は `base_delay × 2^attempt`（attempt は失敗回数、1始まり）。
//! ジッタ・上限・サーキットブレーカーは持たない。呼び出し間で状態を共有しない。

use crate::error::{DeviceTwinError, ErrorKind};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// false なら InvalidResponse は即失敗
    pub retry_invalid_responses: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            retry_invalid_responses: true,
        }
    }
}

impl RetryPolicy {
    /// `attempt` 回目の失敗後の待ち時間（1 → 2s, 2 → 4s, 3 → 8s）
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// エラーの種類から再試行対象かを判定（回数は見ない）
    pub fn is_retryable(&self, error: &DeviceTwinError) -> bool {
        match error.kind() {
            ErrorKind::Transient => true,
            ErrorKind::InvalidResponse => self.retry_invalid_responses,
            ErrorKind::Local => false,
        }
    }
}

/// 解析1回分の状態遷移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32, max_attempts: u32 },
    Backoff { attempt: u32, delay: Duration },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

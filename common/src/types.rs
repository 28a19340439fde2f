//! 解析結果の型定義
//!
//! CLIとテストで共有される型:
//! - ControlType: 操作部の物理的な種類
//! - ControlCategory: UI上のグループ分け
//! - DeviceControl: 識別された操作部1件
//! - DeviceAnalysis: 1回の解析結果（最終出力）

use serde::{Deserialize, Serialize};
use std::fmt;

/// 操作部の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    Button,
    Knob,
    Switch,
    Display,
}

impl ControlType {
    pub const ALL: [ControlType; 4] = [
        ControlType::Button,
        ControlType::Knob,
        ControlType::Switch,
        ControlType::Display,
    ];

    /// スキーマ・JSON上の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::Button => "BUTTON",
            ControlType::Knob => "KNOB",
            ControlType::Switch => "SWITCH",
            ControlType::Display => "DISPLAY",
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 操作部の分類
///
/// 解析ロジックではなく、表示のグループ化と開閉に使う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCategory {
    /// よく使う・重要な操作（開始、停止、電源）
    Primary,
    /// 設定（温度、速度）
    Secondary,
    /// まれにしか使わない設定
    Advanced,
    /// リセット、削除などの破壊的操作
    Danger,
}

impl ControlCategory {
    pub const ALL: [ControlCategory; 4] = [
        ControlCategory::Primary,
        ControlCategory::Secondary,
        ControlCategory::Advanced,
        ControlCategory::Danger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCategory::Primary => "PRIMARY",
            ControlCategory::Secondary => "SECONDARY",
            ControlCategory::Advanced => "ADVANCED",
            ControlCategory::Danger => "DANGER",
        }
    }
}

impl fmt::Display for ControlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 識別された操作部
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceControl {
    /// 解析内で一意なID（リストのキー）
    pub id: String,

    /// 短い読み上げ用の名前
    pub label: String,

    #[serde(rename = "type")]
    pub control_type: ControlType,

    /// 物理的な位置の説明（時計の文字盤表現）
    pub description: String,

    pub category: ControlCategory,

    /// 読み上げ用の詳細テキスト
    pub detail_text: String,
}

impl DeviceControl {
    /// 詳細画面で読み上げるテキスト
    pub fn speech_text(&self) -> String {
        format!("{}. {}", self.label, self.detail_text)
    }
}

/// 1回の解析結果
///
/// 解析成功時に一度だけ生成され、以後は変更しない。
/// 新しいスキャンでは丸ごと置き換える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAnalysis {
    pub device_name: String,

    pub summary: String,

    /// 重大な警告（高温、高電圧など）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_warning: Option<String>,

    /// カテゴリ内の表示優先度順
    pub controls: Vec<DeviceControl>,
}

impl DeviceAnalysis {
    pub fn find_control(&self, id: &str) -> Option<&DeviceControl> {
        self.controls.iter().find(|c| c.id == id)
    }
}

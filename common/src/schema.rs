//! 構造化出力スキーマ
//!
//! バックエンドに宣言するレスポンススキーマ（Gemini `responseSchema` 形式）。
//! 列挙値と必須フィールドは types.rs の型と一致させる。

use crate::types::{ControlCategory, ControlType};
use serde_json::{json, Value};

/// DeviceControl の必須フィールド
pub const CONTROL_REQUIRED_FIELDS: &[&str] =
    &["id", "label", "type", "description", "category", "detailText"];

/// DeviceAnalysis の必須フィールド（safetyWarning は任意）
pub const ANALYSIS_REQUIRED_FIELDS: &[&str] = &["deviceName", "summary", "controls"];

/// 解析結果のレスポンススキーマを生成
pub fn analysis_schema() -> Value {
    let control_types: Vec<&str> = ControlType::ALL.iter().map(|t| t.as_str()).collect();
    let categories: Vec<&str> = ControlCategory::ALL.iter().map(|c| c.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "deviceName": {
                "type": "STRING",
                "description": "Name of the device (e.g. Samsung Washing Machine or Ibuprofen Bottle)"
            },
            "summary": {
                "type": "STRING",
                "description": "Short description of what the device does"
            },
            "safetyWarning": {
                "type": "STRING",
                "description": "Critical hazard the user must know before touching the device (e.g. Hot Surface, High Voltage). Omit if none."
            },
            "controls": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "label": {
                            "type": "STRING",
                            "description": "Clear, action-oriented label (e.g. 'Start Wash' or 'Dosage')"
                        },
                        "type": { "type": "STRING", "enum": control_types },
                        "description": {
                            "type": "STRING",
                            "description": "Physical location using clock-face positions (e.g. 'Large round dial at 12 o'clock, just below the display')"
                        },
                        "category": { "type": "STRING", "enum": categories },
                        "detailText": {
                            "type": "STRING",
                            "description": "Full voice-ready text. Numbered steps for actionable controls, bullets or a short paragraph for informational ones, items separated by newlines."
                        }
                    },
                    "required": CONTROL_REQUIRED_FIELDS
                }
            }
        },
        "required": ANALYSIS_REQUIRED_FIELDS
    })
}

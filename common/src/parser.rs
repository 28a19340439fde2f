//! APIレスポンスパーサー
//!
//! バックエンドのレスポンステキストからJSONを抽出し、
//! DeviceAnalysis へ厳密にパース・検証する。
//!
//! スキーマ指定があってもバックエンドが崩れたJSONを返すことがあるため、
//! ここでは何も信用しない。

use crate::error::{Error, Result};
use crate::types::DeviceAnalysis;
use std::collections::HashSet;

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
/// 3. エラー
///
/// # Examples
/// ```
/// use device_twin_common::extract_json;
///
/// let response = "Here you go: {\"deviceName\": \"Kettle\"}";
/// assert_eq!(extract_json(response).unwrap(), "{\"deviceName\": \"Kettle\"}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("no JSON object found in response".into()))
}

/// 解析レスポンスをパースして検証
///
/// # Returns
/// * `Ok(DeviceAnalysis)` - 検証済みの解析結果
/// * `Err(Error::Parse | Error::Json)` - JSONとして読めない、または型が合わない
/// * `Err(Error::Validation)` - 必須値が空、IDが重複
pub fn parse_analysis_response(response: &str) -> Result<DeviceAnalysis> {
    let json_str = extract_json(response)?;
    let analysis: DeviceAnalysis = serde_json::from_str(json_str)?;
    validate_analysis(analysis)
}

/// 解析結果の不変条件を検証
///
/// 列挙値はデシリアライズ時点で検査済み。ここでは文字列の中身を見る。
/// 空の safetyWarning は「警告なし」に正規化する。
pub fn validate_analysis(mut analysis: DeviceAnalysis) -> Result<DeviceAnalysis> {
    require_text("deviceName", &analysis.device_name)?;
    require_text("summary", &analysis.summary)?;

    if analysis
        .safety_warning
        .as_deref()
        .is_some_and(|w| w.trim().is_empty())
    {
        analysis.safety_warning = None;
    }

    let mut seen = HashSet::new();
    for (i, control) in analysis.controls.iter().enumerate() {
        require_text(&format!("controls[{}].id", i), &control.id)?;
        require_text(&format!("controls[{}].label", i), &control.label)?;
        require_text(&format!("controls[{}].description", i), &control.description)?;
        require_text(&format!("controls[{}].detailText", i), &control.detail_text)?;

        if !seen.insert(control.id.as_str()) {
            return Err(Error::Validation(format!(
                "duplicate control id \"{}\"",
                control.id
            )));
        }
    }

    Ok(analysis)
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is empty", field)));
    }
    Ok(())
}

//! プロンプト生成モジュール
//!
//! 解析用の指示文は固定で、ユーザーが変更することはない。
//! 文面を変えたら PROMPT_VERSION を上げること（キャッシュキーに含まれる）。

use crate::types::ControlCategory;

/// 指示文のバージョン
pub const PROMPT_VERSION: u32 = 2;

/// カテゴリごとの分類基準
fn category_guide(category: ControlCategory) -> &'static str {
    match category {
        ControlCategory::Primary => "The main actions or the most critical information (Start, Stop, Power, Dosage).",
        ControlCategory::Secondary => "Important settings (temperature, speed, program selection).",
        ControlCategory::Advanced => "Rarely used settings.",
        ControlCategory::Danger => "Destructive or irreversible actions (Reset, Delete, Factory Restore).",
    }
}

/// 解析用プロンプト生成
///
/// 安全警告・時計の文字盤による位置説明・手順書式を含む版
pub fn build_analysis_prompt() -> String {
    let categories = ControlCategory::ALL
        .iter()
        .map(|c| format!("   - {}: {}", c, category_guide(*c)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this image of a physical interface, appliance, control panel or label. Act as an accessibility expert creating a "Digital Twin" for a blind or visually impaired user.

1. Identify the device or object and summarize what it does in one or two sentences.
2. Scan the image explicitly for safety hazards (hot surfaces, high voltage, sharp parts, overdose limits, child-safety notes). If any exist, put the single most important one in "safetyWarning". Otherwise omit "safetyWarning".
3. Extract every functional control and every informational section (labels, displays, printed instructions).
4. Simplify labels so they are short and clear when read aloud.
5. In "description", describe where the control is on the physical device using clock-face positions relative to the center of the device (e.g. "Round dial at 3 o'clock, level with the door handle"), plus shape and texture a finger can feel.
6. In "detailText", write text ready for Text-to-Speech:
   - For BUTTON, KNOB or SWITCH: numbered steps ("1. Turn the dial clockwise to Cotton.\n2. Press Start.") followed by what happens as a result.
   - For DISPLAY or printed information: read the content clearly as bullet points or a short paragraph.
   - Separate every step or bullet with an explicit newline character.
7. Categorize each control:
{categories}
8. Give each control a unique "id".
9. Return strict JSON that matches the response schema. Do not add commentary."#
    )
}

//! 端末向けの表示と対話操作
//!
//! 一覧画面: PRIMARY → Settings（SECONDARY）→ Advanced / Dangerous（開閉式）
//! 詳細画面: ラベルと読み上げ用テキスト、物理的な位置

use crate::error::{DeviceTwinError, Result};
use crate::session::{ScanSession, View};
use device_twin_common::{ControlGroups, DeviceAnalysis, DeviceControl};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::fmt::{self, Write};

/// 一覧画面の選択肢
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Control { id: String, text: String },
    ToggleAdvanced { expanded: bool },
    Quit,
}

impl MenuEntry {
    pub fn text(&self) -> String {
        match self {
            MenuEntry::Control { text, .. } => text.clone(),
            MenuEntry::ToggleAdvanced { expanded: true } => {
                "Hide Advanced / Dangerous  −".to_string()
            }
            MenuEntry::ToggleAdvanced { expanded: false } => {
                "Show Advanced / Dangerous  +".to_string()
            }
            MenuEntry::Quit => "Done".to_string(),
        }
    }
}

fn control_entry(control: &DeviceControl) -> MenuEntry {
    MenuEntry::Control {
        id: control.id.clone(),
        text: format!("{} ({})", control.label, control.control_type),
    }
}

/// 一覧画面の選択肢を並べる
pub fn menu_entries(groups: &ControlGroups<'_>, show_advanced: bool) -> Vec<MenuEntry> {
    let mut entries: Vec<MenuEntry> = groups
        .primary
        .iter()
        .chain(groups.secondary.iter())
        .map(|c| control_entry(c))
        .collect();

    if !groups.advanced.is_empty() {
        entries.push(MenuEntry::ToggleAdvanced { expanded: show_advanced });
        if show_advanced {
            entries.extend(groups.advanced.iter().map(|c| control_entry(c)));
        }
    }

    entries.push(MenuEntry::Quit);
    entries
}

/// 一覧画面のテキスト（非対話出力用）
pub fn render_control_list(analysis: &DeviceAnalysis, show_advanced: bool) -> String {
    let mut out = String::new();
    // String への書き込みは失敗しない
    let _ = write_control_list(&mut out, analysis, show_advanced);
    out
}

fn write_control_list(
    out: &mut String,
    analysis: &DeviceAnalysis,
    show_advanced: bool,
) -> fmt::Result {
    let groups = ControlGroups::from_analysis(analysis);

    writeln!(out, "{}", analysis.device_name)?;
    writeln!(out, "{}", analysis.summary)?;
    if let Some(warning) = &analysis.safety_warning {
        writeln!(out, "\n⚠ WARNING: {}", warning)?;
    }

    if groups.is_empty() {
        return writeln!(out, "\nNo controls found.");
    }

    write_section(out, "Primary Controls", &groups.primary)?;
    write_section(out, "Settings", &groups.secondary)?;

    if groups.advanced.is_empty() {
        return Ok(());
    }
    if show_advanced {
        write_section(out, "Advanced / Dangerous", &groups.advanced)
    } else {
        writeln!(out, "\nAdvanced / Dangerous: {} hidden", groups.advanced.len())
    }
}

fn write_section(out: &mut String, title: &str, controls: &[&DeviceControl]) -> fmt::Result {
    if controls.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n{}", title)?;
    for c in controls {
        writeln!(out, "  • {} ({}) - {}", c.label, c.control_type, c.description)?;
    }
    Ok(())
}

/// 詳細画面のテキスト
pub fn render_detail(control: &DeviceControl) -> String {
    format!(
        "{label}\n{rule}\n{detail}\n\nPhysical Location\n{location}\n",
        label = control.label,
        rule = "=".repeat(control.label.chars().count().max(8)),
        detail = control.detail_text,
        location = control.description,
    )
}

/// 詳細画面の操作
enum DetailAction {
    Replay,
    Back,
}

/// 対話式で一覧・詳細を行き来する
pub fn run_interactive_browse(session: &mut ScanSession) -> Result<()> {
    let theme = ColorfulTheme::default();

    if let Some(analysis) = session.analysis() {
        println!("\n{}", analysis.device_name);
        println!("{}", analysis.summary);
        if let Some(warning) = &analysis.safety_warning {
            println!("\n⚠ WARNING: {}", warning);
        }
        println!();
    }

    loop {
        let entries = match session.view() {
            View::ControlList { groups, show_advanced, .. } => {
                Some(menu_entries(&groups, show_advanced))
            }
            View::Detail { .. } => None,
            View::Upload { .. } => return Ok(()),
        };
        let Some(entries) = entries else {
            session.back();
            continue;
        };

        let items: Vec<String> = entries.iter().map(MenuEntry::text).collect();
        let choice = Select::with_theme(&theme)
            .with_prompt("Choose a control")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(|e| DeviceTwinError::Prompt(e.to_string()))?;

        let Some(index) = choice else {
            break;
        };

        match &entries[index] {
            MenuEntry::Control { id, .. } => {
                let Some(control) = session.select(id).cloned() else {
                    continue;
                };
                show_detail(&theme, &control)?;
                session.back();
            }
            MenuEntry::ToggleAdvanced { .. } => {
                session.toggle_advanced();
            }
            MenuEntry::Quit => break,
        }
    }

    session.reset();
    Ok(())
}

fn show_detail(theme: &ColorfulTheme, control: &DeviceControl) -> Result<()> {
    println!("\n{}", render_detail(control));
    println!("🔊 {}\n", control.speech_text());

    loop {
        match prompt_detail_action(theme)? {
            DetailAction::Replay => println!("🔊 {}\n", control.speech_text()),
            DetailAction::Back => return Ok(()),
        }
    }
}

fn prompt_detail_action(theme: &ColorfulTheme) -> Result<DetailAction> {
    let choice = Select::with_theme(theme)
        .items(&["Back", "Replay voice"])
        .default(0)
        .interact_opt()
        .map_err(|e| DeviceTwinError::Prompt(e.to_string()))?;

    Ok(match choice {
        Some(1) => DetailAction::Replay,
        _ => DetailAction::Back,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use device_twin_common::{ControlCategory, ControlType};

    fn control(id: &str, label: &str, category: ControlCategory) -> DeviceControl {
        DeviceControl {
            id: id.to_string(),
            label: label.to_string(),
            control_type: ControlType::Knob,
            description: "Dial at 3 o'clock".to_string(),
            category,
            detail_text: "1. Turn clockwise.\n2. Release.".to_string(),
        }
    }

    fn oven() -> DeviceAnalysis {
        DeviceAnalysis {
            device_name: "Oven".to_string(),
            summary: "Electric wall oven".to_string(),
            safety_warning: Some("Door gets hot".to_string()),
            controls: vec![
                control("a", "Bake", ControlCategory::Primary),
                control("b", "Timer", ControlCategory::Secondary),
                control("c", "Self Clean", ControlCategory::Danger),
            ],
        }
    }

    #[test]
    fn test_menu_collapsed() {
        let analysis = oven();
        let groups = ControlGroups::from_analysis(&analysis);
        let entries = menu_entries(&groups, false);

        assert_eq!(entries.len(), 4);
        assert!(matches!(&entries[0], MenuEntry::Control { id, .. } if id == "a"));
        assert!(matches!(&entries[1], MenuEntry::Control { id, .. } if id == "b"));
        assert_eq!(entries[2], MenuEntry::ToggleAdvanced { expanded: false });
        assert_eq!(entries[3], MenuEntry::Quit);
    }

    #[test]
    fn test_menu_expanded() {
        let analysis = oven();
        let groups = ControlGroups::from_analysis(&analysis);
        let entries = menu_entries(&groups, true);

        assert_eq!(entries.len(), 5);
        assert!(matches!(&entries[3], MenuEntry::Control { id, .. } if id == "c"));
        assert!(entries[2].text().starts_with("Hide"));
    }

    #[test]
    fn test_menu_without_advanced_has_no_toggle() {
        let mut analysis = oven();
        analysis.controls.pop();
        let groups = ControlGroups::from_analysis(&analysis);
        let entries = menu_entries(&groups, false);
        assert!(!entries.iter().any(|e| matches!(e, MenuEntry::ToggleAdvanced { .. })));
    }

    #[test]
    fn test_render_control_list() {
        let text = render_control_list(&oven(), false);
        assert!(text.contains("Oven"));
        assert!(text.contains("WARNING: Door gets hot"));
        assert!(text.contains("Primary Controls"));
        assert!(text.contains("• Bake (KNOB)"));
        assert!(text.contains("Settings"));
        assert!(text.contains("1 hidden"));
        assert!(!text.contains("Self Clean"));
    }

    #[test]
    fn test_render_control_list_expanded() {
        let text = render_control_list(&oven(), true);
        assert!(text.contains("Self Clean"));
    }

    #[test]
    fn test_render_empty() {
        let analysis = DeviceAnalysis {
            device_name: "Sticker".to_string(),
            summary: "Blank".to_string(),
            safety_warning: None,
            controls: vec![],
        };
        assert!(render_control_list(&analysis, false).contains("No controls found."));
    }

    #[test]
    fn test_render_detail() {
        let text = render_detail(&control("a", "Bake", ControlCategory::Primary));
        assert!(text.starts_with("Bake\n"));
        assert!(text.contains("1. Turn clockwise.\n2. Release."));
        assert!(text.contains("Physical Location\nDial at 3 o'clock"));
    }
}

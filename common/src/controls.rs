//! 操作部リストの表示グループ
//!
//! - primary: 常に表示
//! - secondary: 「Settings」見出しで表示
//! - advanced: ADVANCED と DANGER。開閉トグルの中に表示

use crate::types::{ControlCategory, DeviceAnalysis, DeviceControl};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlGroups<'a> {
    pub primary: Vec<&'a DeviceControl>,
    pub secondary: Vec<&'a DeviceControl>,
    pub advanced: Vec<&'a DeviceControl>,
}

impl<'a> ControlGroups<'a> {
    /// 元の並び順を保ったままカテゴリ別に振り分ける
    pub fn from_analysis(analysis: &'a DeviceAnalysis) -> Self {
        let mut groups = Self::default();
        for control in &analysis.controls {
            match control.category {
                ControlCategory::Primary => groups.primary.push(control),
                ControlCategory::Secondary => groups.secondary.push(control),
                ControlCategory::Advanced | ControlCategory::Danger => {
                    groups.advanced.push(control)
                }
            }
        }
        groups
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len() + self.advanced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

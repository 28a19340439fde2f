//! スキャンセッション（表示側の状態機械）
//!
//! Idle → Analyzing → {Success, Error}。Success から詳細表示へ入って戻れる。
//! reset はどの状態からでも Idle に戻し、解析結果と選択を捨てる。
//!
//! 解析リクエストは取り消せないので、開始ごとに世代番号を振り、
//! 古い世代の結果は finish で無視する。

use crate::error::DeviceTwinError;
use device_twin_common::{ControlGroups, DeviceAnalysis, DeviceControl};
use tracing::debug;

/// 解析失敗時に利用者へ見せる文言（技術的な詳細は出さない）
pub const GENERIC_FAILURE_MESSAGE: &str =
    "We couldn't analyze that image. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Analyzing,
    Success,
    Error,
}

/// begin_scan が返す世代トークン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket(u64);

/// 現在表示すべき画面
#[derive(Debug, PartialEq, Eq)]
pub enum View<'a> {
    Upload { loading: bool, error: Option<&'static str> },
    ControlList { analysis: &'a DeviceAnalysis, groups: ControlGroups<'a>, show_advanced: bool },
    Detail { control: &'a DeviceControl },
}

#[derive(Debug)]
pub struct ScanSession {
    status: AppStatus,
    analysis: Option<DeviceAnalysis>,
    selected: Option<String>,
    show_advanced: bool,
    generation: u64,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            status: AppStatus::Idle,
            analysis: None,
            selected: None,
            show_advanced: false,
            generation: 0,
        }
    }

    /// 保存済みの解析結果から開始
    pub fn with_analysis(analysis: DeviceAnalysis) -> Self {
        let mut session = Self::new();
        let ticket = session.begin_scan();
        session.finish(ticket, Ok(analysis));
        session
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn analysis(&self) -> Option<&DeviceAnalysis> {
        self.analysis.as_ref()
    }

    pub fn show_advanced(&self) -> bool {
        self.show_advanced
    }

    pub fn selected(&self) -> Option<&DeviceControl> {
        let id = self.selected.as_deref()?;
        self.analysis.as_ref()?.find_control(id)
    }

    /// 新しいスキャンを開始
    ///
    /// 前の結果と選択は捨てる。進行中の古いリクエストの結果は以後無視される。
    pub fn begin_scan(&mut self) -> ScanTicket {
        self.generation += 1;
        self.status = AppStatus::Analyzing;
        self.analysis = None;
        self.selected = None;
        self.show_advanced = false;
        ScanTicket(self.generation)
    }

    /// 解析結果を反映
    ///
    /// 世代が古い、または既に Analyzing でない場合は何もせず false
    pub fn finish(
        &mut self,
        ticket: ScanTicket,
        result: Result<DeviceAnalysis, DeviceTwinError>,
    ) -> bool {
        if ticket.0 != self.generation || self.status != AppStatus::Analyzing {
            debug!(ticket = ticket.0, current = self.generation, "ignoring stale analysis result");
            return false;
        }

        match result {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                self.status = AppStatus::Success;
            }
            Err(_) => {
                self.analysis = None;
                self.status = AppStatus::Error;
            }
        }
        true
    }

    /// 操作部を選んで詳細表示へ
    pub fn select(&mut self, id: &str) -> Option<&DeviceControl> {
        if self.status != AppStatus::Success {
            return None;
        }
        let control = self.analysis.as_ref()?.find_control(id)?;
        self.selected = Some(control.id.clone());
        Some(control)
    }

    /// 詳細表示から一覧へ戻る
    pub fn back(&mut self) {
        self.selected = None;
    }

    pub fn toggle_advanced(&mut self) -> bool {
        self.show_advanced = !self.show_advanced;
        self.show_advanced
    }

    /// どの状態からでも Idle に戻す
    pub fn reset(&mut self) {
        self.generation += 1;
        self.status = AppStatus::Idle;
        self.analysis = None;
        self.selected = None;
        self.show_advanced = false;
    }

    pub fn view(&self) -> View<'_> {
        match (self.status, self.analysis.as_ref()) {
            (AppStatus::Success, Some(analysis)) => match self.selected() {
                Some(control) => View::Detail { control },
                None => View::ControlList {
                    analysis,
                    groups: ControlGroups::from_analysis(analysis),
                    show_advanced: self.show_advanced,
                },
            },
            (AppStatus::Error, _) => View::Upload {
                loading: false,
                error: Some(GENERIC_FAILURE_MESSAGE),
            },
            (status, _) => View::Upload {
                loading: status == AppStatus::Analyzing,
                error: None,
            },
        }
    }
}

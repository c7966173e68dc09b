use serde::Serialize;

use crate::state::{FileResult, Role};
use crate::stats::StatisticsSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Progress,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    /// `None` when the scorer reports a slot this side does not know.
    pub role: Option<Role>,
    pub percent: f64,
    pub current: Option<u64>,
    pub total: Option<u64>,
    pub model_output: Option<String>,
    pub elapsed_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileCompleted {
    pub file: Option<String>,
    pub total_time: Option<f64>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunComplete {
    pub results: Option<Vec<FileResult>>,
    /// Top-level statistics, used only when `results` is absent.
    pub statistics: Option<Vec<StatisticsSummary>>,
}

/// 一条评分进程输出的类型化解码结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress(ProgressUpdate),
    FileCompleted(FileCompleted),
    RunComplete(RunComplete),
    RunError { message: String },
    Log { message: String, severity: LogSeverity },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunComplete(_) | Self::RunError { .. })
    }
}

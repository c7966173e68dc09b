use serde::Deserialize;
use serde_json::Value;

use super::event::{FileCompleted, ProgressEvent, ProgressUpdate, RunComplete};
use crate::state::{FileResult, Role};
use crate::stats::StatisticsSummary;

/// 一行 stdout 的解码结果
#[derive(Debug, Clone, PartialEq)]
pub enum StdoutLine {
    Event(ProgressEvent),
    /// Not JSON; kept for logging only.
    Diagnostic(String),
    /// Blank line, or JSON without a known `type`.
    Ignored,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StdoutRecord {
    Progress {
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        progress: Option<f64>,
        #[serde(default)]
        current: Option<u64>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default, rename = "modelOutput")]
        model_output: Option<String>,
        #[serde(default)]
        elapsed_time: Option<f64>,
    },
    FileCompleted {
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        total_time: Option<f64>,
        #[serde(default)]
        message: Option<String>,
    },
    Complete {
        #[serde(default)]
        results: Option<Vec<FileResult>>,
        #[serde(default)]
        statistics: Option<Vec<StatisticsSummary>>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

pub fn parse_stdout_line(line: &str) -> StdoutLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StdoutLine::Ignored;
    }
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return StdoutLine::Diagnostic(trimmed.to_string()),
    };
    let record: StdoutRecord = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(target: "evalcmp.progress", error = %e, "unrecognised scorer record");
            return StdoutLine::Ignored;
        }
    };

    let event = match record {
        StdoutRecord::Progress {
            file,
            progress,
            current,
            total,
            model_output,
            elapsed_time,
        } => ProgressEvent::Progress(ProgressUpdate {
            role: file.as_deref().and_then(Role::from_tag),
            percent: progress.unwrap_or(0.0),
            current,
            total,
            model_output: model_output.filter(|s| !s.is_empty()),
            elapsed_time,
        }),
        StdoutRecord::FileCompleted {
            file,
            total_time,
            message,
        } => ProgressEvent::FileCompleted(FileCompleted {
            file,
            total_time,
            message,
        }),
        StdoutRecord::Complete {
            results,
            statistics,
        } => ProgressEvent::RunComplete(RunComplete {
            results,
            statistics,
        }),
        StdoutRecord::Error { message } => ProgressEvent::RunError {
            message: message.unwrap_or_else(|| "scorer reported an error".to_string()),
        },
    };
    StdoutLine::Event(event)
}

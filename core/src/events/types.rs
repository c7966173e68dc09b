use serde::Serialize;

use crate::progress::LogSeverity;
use crate::state::{FileResult, Task, TaskStatus};
use crate::stats::StatisticsSummary;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub task_id: String,
    pub base_progress: f64,
    pub compare_progress: f64,
    pub overall_progress: f64,
    pub overall_current: u64,
    pub overall_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_completed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 推送给观察者的事件；序列化结果即为事件负载
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskEvent {
    TaskCreated(Box<Task>),
    #[serde(rename_all = "camelCase")]
    TaskUpdated {
        task_id: String,
        status: TaskStatus,
        task: Box<Task>,
    },
    #[serde(rename_all = "camelCase")]
    TaskDeleted { task_id: String },
    EvaluationProgress(ProgressPayload),
    #[serde(rename_all = "camelCase")]
    EvaluationLog {
        task_id: String,
        message: String,
        #[serde(rename = "type")]
        severity: LogSeverity,
    },
    #[serde(rename_all = "camelCase")]
    EvaluationComplete {
        task_id: String,
        task: Box<Task>,
        results: Vec<FileResult>,
        statistics: Vec<StatisticsSummary>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    EvaluationError { task_id: String, message: String },
    #[serde(rename_all = "camelCase")]
    EvaluationStopped { task_id: String, message: String },
}

impl TaskEvent {
    /// Wire name of the event, e.g. for the SSE `event:` field.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TaskCreated(_) => "taskCreated",
            Self::TaskUpdated { .. } => "taskUpdated",
            Self::TaskDeleted { .. } => "taskDeleted",
            Self::EvaluationProgress(_) => "evaluationProgress",
            Self::EvaluationLog { .. } => "evaluationLog",
            Self::EvaluationComplete { .. } => "evaluationComplete",
            Self::EvaluationError { .. } => "evaluationError",
            Self::EvaluationStopped { .. } => "evaluationStopped",
        }
    }

    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskCreated(task) => &task.id,
            Self::EvaluationProgress(p) => &p.task_id,
            Self::TaskUpdated { task_id, .. }
            | Self::TaskDeleted { task_id }
            | Self::EvaluationLog { task_id, .. }
            | Self::EvaluationComplete { task_id, .. }
            | Self::EvaluationError { task_id, .. }
            | Self::EvaluationStopped { task_id, .. } => task_id,
        }
    }

    pub fn updated(task: &Task) -> Self {
        Self::TaskUpdated {
            task_id: task.id.clone(),
            status: task.status,
            task: Box::new(task.clone()),
        }
    }
}

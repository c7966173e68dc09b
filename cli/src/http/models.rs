//! HTTP API数据模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use evalcmp_core::api::{
    CompletedFile, FileConfigs, FileResult, Role, StatisticsSummary, Task, TaskError,
    TaskErrorKind,
};
use serde::{Deserialize, Serialize};

// ============= Tasks =============

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResponse {
    pub success: bool,
    pub task_id: String,
    pub task: Task,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            task_id: None,
        }
    }

    pub fn for_task(message: impl Into<String>, task_id: &str) -> Self {
        Self {
            task_id: Some(task_id.to_string()),
            ..Self::new(message)
        }
    }
}

// ============= Evaluation =============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub file_configs: Option<FileConfigs>,
    #[serde(default)]
    pub teacher_model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckScoreRequest {
    pub file_type: String,
}

impl CheckScoreRequest {
    pub fn role(&self) -> Result<Role, HttpServerError> {
        Role::from_tag(&self.file_type).ok_or_else(|| {
            HttpServerError::InvalidRequest(format!("unknown fileType: {}", self.file_type))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckScoreResponse {
    pub has_score: bool,
}

#[derive(Debug, Serialize)]
pub struct DirectComparisonResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<FileResult>,
    pub statistics: Vec<StatisticsSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLogRequest {
    #[serde(default)]
    pub evaluation_log: String,
}

// ============= Completed files =============

/// 目录条目，附带前端使用的 `uploader` 字段
#[derive(Debug, Serialize)]
pub struct CompletedFileView {
    #[serde(flatten)]
    pub file: CompletedFile,
    pub uploader: String,
}

impl From<CompletedFile> for CompletedFileView {
    fn from(file: CompletedFile) -> Self {
        let uploader = if file.submitter.is_empty() {
            "未知".to_string()
        } else {
            file.submitter.clone()
        };
        Self { file, uploader }
    }
}

#[derive(Debug, Serialize)]
pub struct CompletedFilesResponse {
    pub success: bool,
    pub files: Vec<CompletedFileView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteRequest {
    #[serde(default)]
    pub file_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

// ============= Upload =============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileInfo {
    pub filename: String,
    pub row_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file1: UploadedFileInfo,
    pub file2: UploadedFileInfo,
    pub session_id: String,
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub running_tasks: usize,
    pub timestamp: String,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}

impl From<TaskError> for HttpServerError {
    fn from(e: TaskError) -> Self {
        let msg = e.to_string();
        match e.kind() {
            TaskErrorKind::Validation => Self::InvalidRequest(msg),
            TaskErrorKind::NotFound => Self::NotFound(msg),
            TaskErrorKind::Conflict => Self::Conflict(msg),
            TaskErrorKind::Internal => {
                tracing::error!(error = %msg, "request failed");
                Self::Internal(msg)
            }
        }
    }
}

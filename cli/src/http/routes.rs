//! HTTP路由handlers

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Local;
use evalcmp_core::api::{
    validate_rows, CatalogError, FileSource, NewTask, Role, Task, TaskStatus,
};
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use uuid::Uuid;

use crate::http::{
    models::*,
    sse::events_handler,
    state::AppState,
    upload::{
        content_disposition, discard_uploads, save_upload, MultipartForm, UploadedPart,
        XLSX_CONTENT_TYPE,
    },
};

/// 上传请求体上限
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

const JSONL_CONTENT_TYPE: &str = "application/x-ndjson; charset=utf-8";

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.server.static_dir);

    let router = Router::new()
        .route("/api/tasks", get(list_tasks_handler))
        .route("/api/create-task", post(create_task_handler))
        .route(
            "/api/tasks/:id",
            get(get_task_handler).delete(delete_task_handler),
        )
        .route("/api/tasks/:id/evaluate", post(evaluate_handler))
        .route("/api/tasks/:id/stop", post(stop_handler))
        .route(
            "/api/tasks/:id/check-score-column",
            post(check_score_column_handler),
        )
        .route(
            "/api/tasks/:id/direct-comparison",
            post(direct_comparison_handler),
        )
        .route("/api/tasks/:id/progress", get(progress_handler))
        .route("/api/tasks/:id/save-log", post(save_log_handler))
        .route("/api/tasks/:id/detailed-report", get(detailed_report_handler))
        .route("/api/tasks/:id/download/:kind", get(download_artifact_handler))
        .route("/api/completed-files", get(completed_files_handler))
        .route(
            "/api/completed-files/batch-delete",
            delete(batch_delete_handler),
        )
        .route(
            "/api/completed-files/:id/download",
            get(download_completed_handler),
        )
        .route("/api/upload", post(upload_handler))
        .route("/api/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let router = if static_dir.is_dir() {
        router.fallback_service(ServeDir::new(static_dir))
    } else {
        warn!(dir = %static_dir.display(), "static directory missing; front end not served");
        router
    };

    router.with_state(state)
}

fn fail(state: &AppState, e: impl Into<HttpServerError>) -> HttpServerError {
    state.record_error();
    e.into()
}

fn catalog_failure(e: CatalogError) -> HttpServerError {
    HttpServerError::Internal(e.to_string())
}

/// 读取待下载文件，文件不存在时返回 404
async fn read_download(path: &str) -> Result<Vec<u8>, HttpServerError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HttpServerError::NotFound(format!("file missing: {path}"))
        } else {
            HttpServerError::Internal(e.to_string())
        }
    })
}

fn xlsx_attachment(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(file_name)),
        ],
        bytes,
    )
        .into_response()
}

// ============= Tasks =============

/// GET /api/tasks
async fn list_tasks_handler(State(state): State<AppState>) -> Json<TaskListResponse> {
    state.record_request("/api/tasks");
    Json(TaskListResponse {
        tasks: state.manager.list_tasks().await,
    })
}

/// GET /api/tasks/:id
async fn get_task_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id");
    let task = state
        .manager
        .get_task(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(TaskResponse {
        success: true,
        task,
    }))
}

/// DELETE /api/tasks/:id
async fn delete_task_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id");
    state
        .manager
        .delete_task(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(MessageResponse::for_task("任务已删除", &id)))
}

/// POST /api/create-task - multipart: taskName, submitter, {base,compare}{Type,FileId,File}
async fn create_task_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CreateTaskResponse>, HttpServerError> {
    state.record_request("/api/create-task");
    let form = MultipartForm::read(multipart)
        .await
        .map_err(|e| fail(&state, e))?;

    let mut saved = Vec::new();
    let result = create_from_form(&state, &form, &mut saved).await;
    if result.is_err() {
        discard_uploads(&saved).await;
    }
    let task = result.map_err(|e| fail(&state, e))?;

    info!(task_id = %task.id, name = %task.name, "task created via http");
    Ok(Json(CreateTaskResponse {
        success: true,
        task_id: task.id.clone(),
        task,
    }))
}

async fn create_from_form(
    state: &AppState,
    form: &MultipartForm,
    saved: &mut Vec<PathBuf>,
) -> Result<Task, HttpServerError> {
    let upload_dir = PathBuf::from(&state.config.storage.upload_dir);
    let base = side_source(form, "base", &upload_dir, saved).await?;
    let compare = side_source(form, "compare", &upload_dir, saved).await?;

    let new = NewTask {
        name: form.text("taskName").unwrap_or_default().to_string(),
        submitter: form.text("submitter").unwrap_or_default().to_string(),
        base,
        compare,
    };
    Ok(state.manager.create_task(new).await?)
}

/// `{prefix}Type == "select"` picks a catalog entry, otherwise the uploaded `{prefix}File`.
async fn side_source(
    form: &MultipartForm,
    prefix: &str,
    upload_dir: &std::path::Path,
    saved: &mut Vec<PathBuf>,
) -> Result<Option<FileSource>, HttpServerError> {
    if form.text(&format!("{prefix}Type")) == Some("select") {
        return Ok(form
            .text(&format!("{prefix}FileId"))
            .map(|id| FileSource::Catalog { id: id.to_string() }));
    }

    let field = format!("{prefix}File");
    let Some(part) = form.files.get(&field) else {
        return Ok(None);
    };
    let path = save_upload(upload_dir, &field, part).await?;
    saved.push(path.clone());
    Ok(Some(FileSource::Uploaded {
        path: path.display().to_string(),
        name: part.file_name.clone(),
    }))
}

// ============= Evaluation =============

/// POST /api/tasks/:id/evaluate
async fn evaluate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<EvaluateRequest>>,
) -> Result<Json<MessageResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id/evaluate");
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let task = state
        .manager
        .start_evaluation(&id, req.file_configs.unwrap_or_default(), req.teacher_model)
        .await
        .map_err(|e| fail(&state, e))?;

    match task.status {
        TaskStatus::Running => Ok(Json(MessageResponse::for_task("评测已开始", &id))),
        TaskStatus::Completed => Ok(Json(MessageResponse::for_task("评测已完成", &id))),
        _ => Err(fail(
            &state,
            HttpServerError::Internal(
                task.error
                    .unwrap_or_else(|| "evaluation failed to start".to_string()),
            ),
        )),
    }
}

/// POST /api/tasks/:id/stop
async fn stop_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id/stop");
    state
        .manager
        .stop_evaluation(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(MessageResponse::for_task("评测已停止", &id)))
}

/// POST /api/tasks/:id/check-score-column
async fn check_score_column_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CheckScoreRequest>,
) -> Result<Json<CheckScoreResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id/check-score-column");
    let role = req.role().map_err(|e| fail(&state, e))?;
    let has_score = state
        .manager
        .check_score_column(&id, role)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(CheckScoreResponse { has_score }))
}

/// POST /api/tasks/:id/direct-comparison
async fn direct_comparison_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DirectComparisonResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id/direct-comparison");
    let outcome = state
        .manager
        .direct_comparison(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(DirectComparisonResponse {
        success: true,
        message: "直接对比完成".to_string(),
        results: outcome.results,
        statistics: outcome.statistics,
    }))
}

/// GET /api/tasks/:id/progress
async fn progress_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/tasks/:id/progress");
    let snapshot = state
        .manager
        .progress(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(snapshot).into_response())
}

/// POST /api/tasks/:id/save-log
async fn save_log_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SaveLogRequest>,
) -> Result<Json<MessageResponse>, HttpServerError> {
    state.record_request("/api/tasks/:id/save-log");
    state
        .manager
        .save_log(&id, req.evaluation_log)
        .await
        .map_err(|e| fail(&state, e))?;
    Ok(Json(MessageResponse::for_task("日志已保存", &id)))
}

/// GET /api/tasks/:id/detailed-report - 需要两侧结果
async fn detailed_report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/tasks/:id/detailed-report");
    let task = state
        .manager
        .get_task(&id)
        .await
        .map_err(|e| fail(&state, e))?;
    let bytes = state
        .manager
        .export_report(&id, 2)
        .await
        .map_err(|e| fail(&state, e))?;
    let name = format!(
        "详细对比报告_{}_{}.xlsx",
        task.name,
        Local::now().format("%Y%m%d%H%M%S")
    );
    Ok(xlsx_attachment(&name, bytes))
}

/// 单侧评测产物
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    /// 评分过程中记录的模型输出（jsonl）
    Outputs(Role),
    /// 评分进程写出的评分结果表
    Scored(Role),
}

impl Artifact {
    /// `{base|compare|file1|file2}_{outputs|scored}`
    fn parse(kind: &str) -> Option<Self> {
        let (side, what) = kind.rsplit_once('_')?;
        let role = Role::from_tag(side)?;
        match what {
            "outputs" => Some(Self::Outputs(role)),
            "scored" => Some(Self::Scored(role)),
            _ => None,
        }
    }

    fn role(self) -> Role {
        match self {
            Self::Outputs(role) | Self::Scored(role) => role,
        }
    }
}

/// GET /api/tasks/:id/download/:kind - 模型输出或评分结果
async fn download_artifact_handler(
    State(state): State<AppState>,
    Path((id, kind)): Path<(String, String)>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/tasks/:id/download/:kind");
    let artifact = Artifact::parse(&kind).ok_or_else(|| {
        fail(
            &state,
            HttpServerError::InvalidRequest(format!("无效的文件类型: {kind}")),
        )
    })?;
    let task = state
        .manager
        .get_task(&id)
        .await
        .map_err(|e| fail(&state, e))?;

    let role = artifact.role();
    let display = task.display_name(role).unwrap_or_else(|| role.to_string());
    let stem = display.strip_suffix(".xlsx").unwrap_or(&display);

    match artifact {
        Artifact::Outputs(_) => {
            let path = task.model_output_paths.get(&role).ok_or_else(|| {
                fail(
                    &state,
                    HttpServerError::NotFound(format!("{role} model outputs for task {id}")),
                )
            })?;
            let bytes = read_download(path).await.map_err(|e| fail(&state, e))?;
            let name = format!("{stem}_模型输出.jsonl");
            Ok((
                [
                    (header::CONTENT_TYPE, JSONL_CONTENT_TYPE.to_string()),
                    (header::CONTENT_DISPOSITION, content_disposition(&name)),
                ],
                bytes,
            )
                .into_response())
        }
        Artifact::Scored(_) => {
            let path = task
                .results
                .iter()
                .filter(|r| r.role == Some(role))
                .find_map(|r| r.output_path.as_deref())
                .ok_or_else(|| {
                    fail(
                        &state,
                        HttpServerError::NotFound(format!("{role} scored file for task {id}")),
                    )
                })?;
            let bytes = read_download(path).await.map_err(|e| fail(&state, e))?;
            Ok(xlsx_attachment(&format!("{stem}_评分结果.xlsx"), bytes))
        }
    }
}

// ============= Completed files =============

/// GET /api/completed-files
async fn completed_files_handler(
    State(state): State<AppState>,
) -> Result<Json<CompletedFilesResponse>, HttpServerError> {
    state.record_request("/api/completed-files");
    let mut files = state
        .manager
        .services()
        .catalog
        .list()
        .await
        .map_err(|e| fail(&state, catalog_failure(e)))?;
    files.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));
    Ok(Json(CompletedFilesResponse {
        success: true,
        files: files.into_iter().map(CompletedFileView::from).collect(),
    }))
}

/// DELETE /api/completed-files/batch-delete
async fn batch_delete_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteResponse>, HttpServerError> {
    state.record_request("/api/completed-files/batch-delete");
    let ids = req.file_ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(fail(
            &state,
            HttpServerError::InvalidRequest("请选择要删除的文件".to_string()),
        ));
    }
    let deleted_count = state
        .manager
        .services()
        .catalog
        .remove_many(&ids)
        .await
        .map_err(|e| fail(&state, catalog_failure(e)))?;
    info!(requested = ids.len(), deleted_count, "completed files removed");
    Ok(Json(BatchDeleteResponse {
        success: true,
        message: format!("成功删除 {deleted_count} 个文件"),
        deleted_count,
    }))
}

/// GET /api/completed-files/:id/download
async fn download_completed_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request("/api/completed-files/:id/download");
    let file = state
        .manager
        .services()
        .catalog
        .get(&id)
        .await
        .map_err(|e| fail(&state, catalog_failure(e)))?
        .ok_or_else(|| fail(&state, HttpServerError::NotFound(format!("completed file {id}"))))?;

    let bytes = read_download(&file.file_path)
        .await
        .map_err(|e| fail(&state, e))?;

    let name = if file.name.to_ascii_lowercase().ends_with(".xlsx") {
        file.name.clone()
    } else {
        format!("{}.xlsx", file.name)
    };
    Ok(xlsx_attachment(&name, bytes))
}

// ============= Upload =============

/// POST /api/upload - 校验一对待评测文件（file1, file2）
async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpServerError> {
    state.record_request("/api/upload");
    let form = MultipartForm::read(multipart)
        .await
        .map_err(|e| fail(&state, e))?;
    let (Some(file1), Some(file2)) = (form.files.get("file1"), form.files.get("file2")) else {
        return Err(fail(
            &state,
            HttpServerError::InvalidRequest("请同时上传 file1 和 file2".to_string()),
        ));
    };

    let mut saved = Vec::new();
    let result = validate_pair(&state, file1, file2, &mut saved).await;
    if result.is_err() {
        discard_uploads(&saved).await;
    }
    let (rows1, rows2) = result.map_err(|e| fail(&state, e))?;

    Ok(Json(UploadResponse {
        success: true,
        message: "文件上传成功".to_string(),
        file1: UploadedFileInfo {
            filename: file1.file_name.clone(),
            row_count: rows1,
        },
        file2: UploadedFileInfo {
            filename: file2.file_name.clone(),
            row_count: rows2,
        },
        session_id: Uuid::new_v4().to_string(),
    }))
}

async fn validate_pair(
    state: &AppState,
    file1: &UploadedPart,
    file2: &UploadedPart,
    saved: &mut Vec<PathBuf>,
) -> Result<(usize, usize), HttpServerError> {
    let upload_dir = PathBuf::from(&state.config.storage.upload_dir);
    let mut counts = Vec::with_capacity(2);
    for (label, part) in [("file1", file1), ("file2", file2)] {
        let path = save_upload(&upload_dir, label, part).await?;
        saved.push(path.clone());
        let rows = state
            .manager
            .services()
            .codec
            .read_rows(&path)
            .await
            .map_err(|e| HttpServerError::InvalidRequest(format!("{label}: {e}")))?;
        validate_rows(&rows)
            .map_err(|msg| HttpServerError::InvalidRequest(format!("{label}: {msg}")))?;
        counts.push(rows.len());
    }
    if counts[0] != counts[1] {
        return Err(HttpServerError::InvalidRequest(format!(
            "两个文件的行数不一致: {} vs {}",
            counts[0], counts[1]
        )));
    }
    Ok((counts[0], counts[1]))
}

// ============= Health =============

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let running_tasks = state.manager.running_count().await;
    let stats = state.stats();

    Json(HealthResponse {
        status: "healthy".into(),
        uptime_seconds: stats.uptime_seconds(),
        requests_handled: stats.requests_total,
        running_tasks,
        timestamp: Local::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use evalcmp_core::api::{
        AppConfig, CellStyle, ServicesFactory, Sheet, SheetCodec, TaskManager, Workbook,
    };
    use evalcmp_plugins::services::PluginServicesFactory;
    use evalcmp_plugins::sheet::XlsxSheetCodec;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "evalcmp-test-boundary";
    const HEADER: [&str; 7] = [
        "id",
        "instruction",
        "reference",
        "parent_class",
        "subclass",
        "model_ans",
        "source",
    ];

    fn test_config(dir: &std::path::Path) -> AppConfig {
        let root = dir.display().to_string();
        let mut cfg = AppConfig::default();
        cfg.storage.upload_dir = format!("{root}/uploads");
        cfg.storage.completed_dir = format!("{root}/completed");
        cfg.storage.catalog_path = format!("{root}/completed/completed_files.json");
        cfg.storage.model_output_dir = format!("{root}/model_outputs");
        cfg.server.static_dir = format!("{root}/public");
        cfg
    }

    async fn state_for(cfg: AppConfig) -> AppState {
        let services = PluginServicesFactory.build_services(&cfg).await.unwrap();
        AppState::new(TaskManager::new(&cfg, services), cfg)
    }

    async fn test_state(dir: &std::path::Path) -> AppState {
        state_for(test_config(dir)).await
    }

    async fn xlsx(header: &[&str], rows: usize) -> Vec<u8> {
        let mut sheet = Sheet::new("Sheet1");
        sheet.append_row(header.iter().copied(), CellStyle::PLAIN);
        for i in 0..rows {
            let id = (i + 1).to_string();
            sheet.append_row(
                header.iter().map(|h| if *h == "id" { id.clone() } else { format!("{h}-{id}") }),
                CellStyle::PLAIN,
            );
        }
        let mut wb = Workbook::new();
        wb.push(sheet);
        XlsxSheetCodec::new().encode(&wb).await.unwrap()
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, Vec<u8>),
    }

    fn multipart_request(uri: &str, parts: Vec<Part<'_>>) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let resp = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn fetch(state: &AppState, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let resp = create_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    async fn create_compare_only(state: &AppState) -> String {
        let req = multipart_request(
            "/api/create-task",
            vec![
                Part::Text("taskName", "nightly"),
                Part::Text("submitter", "qa"),
                Part::File("compareFile", "cmp.xlsx", xlsx(&HEADER, 1).await),
            ],
        );
        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["taskId"].as_str().unwrap().to_string()
    }

    fn upload_dir_entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir.join("uploads")).unwrap().count()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let (status, body) = send(&state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["running_tasks"], 0);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let (status, body) = send(&state, get("/api/tasks/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "NOT_FOUND");
        assert_eq!(state.stats().errors_total, 1);
    }

    #[tokio::test]
    async fn create_task_from_upload() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let req = multipart_request(
            "/api/create-task",
            vec![
                Part::Text("taskName", "nightly"),
                Part::Text("submitter", "qa"),
                Part::Text("compareType", "upload"),
                Part::File("compareFile", "cmp.xlsx", xlsx(&HEADER, 3).await),
            ],
        );
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["task"]["status"], "pending");
        assert_eq!(body["task"]["compareFile"]["name"], "cmp.xlsx");
        let id = body["taskId"].as_str().unwrap().to_string();

        let (_, list) = send(&state, get("/api/tasks")).await;
        assert_eq!(list["tasks"].as_array().unwrap().len(), 1);

        let (status, check) = send(
            &state,
            json_request(
                "POST",
                &format!("/api/tasks/{id}/check-score-column"),
                serde_json::json!({"fileType": "compare"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(check["hasScore"], false);

        let (status, _) = send(&state, get(&format!("/api/tasks/{id}/detailed-report"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_task_rejects_missing_columns_and_discards_upload() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let req = multipart_request(
            "/api/create-task",
            vec![
                Part::Text("taskName", "nightly"),
                Part::Text("submitter", "qa"),
                Part::File("compareFile", "cmp.xlsx", xlsx(&["id", "instruction"], 1).await),
            ],
        );
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("model_ans"));
        assert_eq!(upload_dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn create_task_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let req = multipart_request(
            "/api/create-task",
            vec![
                Part::Text("taskName", "nightly"),
                Part::Text("submitter", "qa"),
                Part::File("compareFile", "cmp.csv", b"id,instruction".to_vec()),
            ],
        );
        let (status, _) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(upload_dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn upload_checks_row_counts() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let ok = multipart_request(
            "/api/upload",
            vec![
                Part::File("file1", "a.xlsx", xlsx(&HEADER, 2).await),
                Part::File("file2", "b.xlsx", xlsx(&HEADER, 2).await),
            ],
        );
        let (status, body) = send(&state, ok).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["file1"]["rowCount"], 2);
        assert_eq!(body["file2"]["filename"], "b.xlsx");

        let mismatched = multipart_request(
            "/api/upload",
            vec![
                Part::File("file1", "a.xlsx", xlsx(&HEADER, 2).await),
                Part::File("file2", "b.xlsx", xlsx(&HEADER, 3).await),
            ],
        );
        let (status, body) = send(&state, mismatched).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("行数不一致"));
        assert_eq!(upload_dir_entries(dir.path()), 2);
    }

    #[tokio::test]
    async fn completed_file_routes() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;

        let (status, body) = send(&state, get("/api/completed-files")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["files"], serde_json::json!([]));

        let (status, _) = send(&state, get("/api/completed-files/missing/download")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &state,
            json_request(
                "DELETE",
                "/api/completed-files/batch-delete",
                serde_json::json!({"fileIds": []}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn artifact_kinds() {
        assert_eq!(
            Artifact::parse("compare_outputs"),
            Some(Artifact::Outputs(Role::Compare))
        );
        assert_eq!(Artifact::parse("file1_scored"), Some(Artifact::Scored(Role::Base)));
        assert_eq!(Artifact::parse("file2_outputs"), Some(Artifact::Outputs(Role::Compare)));
        assert_eq!(Artifact::parse("comprehensive"), None);
        assert_eq!(Artifact::parse("base_report"), None);
        assert_eq!(Artifact::parse("third_scored"), None);
    }

    #[tokio::test]
    async fn task_downloads_before_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let id = create_compare_only(&state).await;

        let (status, _) = send(&state, get(&format!("/api/tasks/{id}/download/everything"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for kind in ["compare_outputs", "compare_scored", "base_scored", "file1_outputs"] {
            let (status, body) =
                send(&state, get(&format!("/api/tasks/{id}/download/{kind}"))).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{kind}: {body}");
        }

        let (status, _) = send(&state, get("/api/tasks/nope/download/compare_outputs")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scorer_outputs_and_scored_file_are_downloadable() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.scorer.program = "sh".into();
        cfg.scorer.script = "-c".into();
        let state = state_for(cfg).await;
        let id = create_compare_only(&state).await;

        // $0 is the compare file path; the scorer reports it back as its output
        let scorer = r#"printf '%s\n' '{"type":"progress","file":"compare","progress":100,"current":1,"total":1,"modelOutput":"answer one"}'
printf '{"type":"complete","results":[{"type":"compare","outputPath":"%s"}]}\n' "$0""#;
        let (status, body) = send(
            &state,
            json_request(
                "POST",
                &format!("/api/tasks/{id}/evaluate"),
                serde_json::json!({
                    "fileConfigs": {"compareFile": {"evaluate": true, "name": "cmp-run.xlsx"}},
                    "teacherModel": scorer,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let mut task = state.manager.get_task(&id).await.unwrap();
        for _ in 0..100 {
            if !task.is_running() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            task = state.manager.get_task(&id).await.unwrap();
        }
        assert_eq!(task.status, TaskStatus::Completed, "{:?}", task.error);

        let (status, headers, bytes) =
            fetch(&state, get(&format!("/api/tasks/{id}/download/compare_outputs"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/x-ndjson"));
        let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("cmp-run_"), "{disposition}");
        assert!(!disposition.contains(".xlsx"), "{disposition}");
        assert!(String::from_utf8(bytes).unwrap().contains("answer one"));

        let (status, headers, bytes) =
            fetch(&state, get(&format!("/api/tasks/{id}/download/file2_scored"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(&bytes[..2], b"PK");

        let (status, _) = send(&state, get(&format!("/api/tasks/{id}/download/base_outputs"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! 任务管理器：任务仓库、评分进程生命周期与事件广播

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, oneshot, Mutex};
use uuid::Uuid;

use crate::config::{AppConfig, ScorerConfig};
use crate::context::Services;
use crate::error::TaskError;
use crate::events::{EventBroadcaster, ProgressPayload, TaskEvent};
use crate::progress::{overall_progress, LogSeverity, ProgressEvent, RunComplete};
use crate::report::build_report;
use crate::runner::{supervise, RunEventSink, RunExit, RunnerStartArgs, SuperviseInput};
use crate::sheet::{has_score_column, validate_rows, ScoredRow};
use crate::stats::compute_statistics;
use crate::util::append_bounded;

use super::complete;
use super::store::{ProcessHandle, TaskStore};
use super::transitions::StateTransition;
use super::types::{
    ComparisonOutcome, FileConfigs, FileOrigin, FileRef, FileResult, FileSource, ModelOutput,
    NewTask, ProgressSnapshot, Role, Task, TaskStatus,
};

/// 任务管理器
///
/// Cheap to clone; all clones share one task store and one event channel.
/// The store lock is never held across spreadsheet reads.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<TaskManagerInner>,
}

struct TaskManagerInner {
    store: Mutex<TaskStore>,
    services: Services,
    events: EventBroadcaster,
    scorer: ScorerConfig,
    model_output_dir: PathBuf,
    transcript_max_bytes: usize,
    next_token: AtomicU64,
}

/// 一次评分运行中的单个文件
struct WorkItem {
    role: Role,
    path: String,
    name: String,
}

impl TaskManager {
    pub fn new(cfg: &AppConfig, services: Services) -> Self {
        let inner = TaskManagerInner {
            store: Mutex::new(TaskStore::new()),
            services,
            events: EventBroadcaster::new(cfg.events.channel_capacity),
            scorer: cfg.scorer.clone(),
            model_output_dir: PathBuf::from(&cfg.storage.model_output_dir),
            transcript_max_bytes: cfg.events.transcript_max_bytes,
            next_token: AtomicU64::new(1),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// 订阅任务事件
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.inner.events
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    fn emit(&self, event: TaskEvent) {
        self.inner.events.broadcast(event);
    }

    /// 所有任务，按创建顺序
    pub async fn list_tasks(&self) -> Vec<Task> {
        self.inner.store.lock().await.list().to_vec()
    }

    pub async fn get_task(&self, id: &str) -> Result<Task, TaskError> {
        self.inner
            .store
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(format!("task {id}")))
    }

    /// Number of tasks that currently own a scorer process.
    pub async fn running_count(&self) -> usize {
        self.inner.store.lock().await.bound_count()
    }

    /// 创建任务：校验上传文件的必填列，或解析目录中的已完成文件
    pub async fn create_task(&self, new: NewTask) -> Result<Task, TaskError> {
        let name = new.name.trim().to_string();
        let submitter = new.submitter.trim().to_string();
        if name.is_empty() || submitter.is_empty() {
            return Err(TaskError::Validation(
                "task name and submitter are required".into(),
            ));
        }
        let Some(compare) = new.compare else {
            return Err(TaskError::Validation("a compare file is required".into()));
        };

        let base_file = match new.base {
            Some(src) => Some(self.resolve_source(Role::Base, src).await?),
            None => None,
        };
        let compare_file = self.resolve_source(Role::Compare, compare).await?;

        let task = Task::new(
            Uuid::new_v4().to_string(),
            name,
            submitter,
            base_file,
            compare_file,
        );
        {
            let mut store = self.inner.store.lock().await;
            store.insert(task.clone());
        }
        tracing::info!(
            target: "evalcmp.task",
            task_id = %task.id,
            name = %task.name,
            has_base = task.base_file.is_some(),
            "task created"
        );
        self.emit(TaskEvent::TaskCreated(Box::new(task.clone())));
        Ok(task)
    }

    async fn resolve_source(&self, role: Role, src: FileSource) -> Result<FileRef, TaskError> {
        match src {
            FileSource::Uploaded { path, name } => {
                let rows = self.inner.services.codec.read_rows(Path::new(&path)).await?;
                validate_rows(&rows).map_err(|e| TaskError::Validation(format!("{role} file: {e}")))?;
                Ok(FileRef {
                    path,
                    name,
                    origin: FileOrigin::Uploaded,
                    catalog_id: None,
                })
            }
            FileSource::Catalog { id } => {
                let entry = self
                    .inner
                    .services
                    .catalog
                    .get(&id)
                    .await?
                    .ok_or_else(|| TaskError::NotFound(format!("{role} file {id}")))?;
                Ok(FileRef {
                    path: entry.file_path,
                    name: entry.name,
                    origin: FileOrigin::Catalog,
                    catalog_id: Some(entry.id),
                })
            }
        }
    }

    /// 删除任务；评测中的任务不可删除
    pub async fn delete_task(&self, id: &str) -> Result<(), TaskError> {
        {
            let mut store = self.inner.store.lock().await;
            let task = store
                .get(id)
                .ok_or_else(|| TaskError::NotFound(format!("task {id}")))?;
            if !StateTransition::can_delete(task.status) {
                return Err(TaskError::Conflict(
                    "cannot delete a task while it is being evaluated".into(),
                ));
            }
            store.remove(id);
        }
        tracing::info!(target: "evalcmp.task", task_id = %id, "task deleted");
        self.emit(TaskEvent::TaskDeleted {
            task_id: id.to_string(),
        });
        Ok(())
    }

    /// 开始（或重新开始）评测
    ///
    /// When a base file exists and both files already carry scores, the
    /// scorer is bypassed and the task completes as a direct comparison.
    pub async fn start_evaluation(
        &self,
        id: &str,
        configs: FileConfigs,
        teacher_model: Option<String>,
    ) -> Result<Task, TaskError> {
        let snapshot = self.get_task(id).await?;
        StateTransition::validate(snapshot.status, TaskStatus::Running)?;

        if let Some((base_rows, compare_rows)) = self.direct_candidates(&snapshot).await {
            tracing::info!(
                target: "evalcmp.task",
                task_id = %id,
                "both files already scored, comparing directly"
            );
            self.complete_directly(id, Some(configs), base_rows, compare_rows)
                .await?;
            return self.get_task(id).await;
        }

        let mut store = self.inner.store.lock().await;
        let task = store
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(format!("task {id}")))?;
        StateTransition::validate(task.status, TaskStatus::Running)?;

        task.status = TaskStatus::Running;
        task.start_time = Some(Utc::now());
        task.completed_time = None;
        task.stopped_time = None;
        task.file_configs = Some(configs.clone());
        task.teacher_model = teacher_model.clone();
        task.base_progress = 0.0;
        task.compare_progress = 0.0;
        task.results.clear();
        task.statistics.clear();
        task.evaluation_log.clear();
        task.error = None;
        task.model_outputs.clear();
        task.model_output_paths.clear();

        let work: Vec<WorkItem> = Role::ALL
            .into_iter()
            .filter(|role| configs.get(*role).evaluate)
            .filter_map(|role| {
                let file = task.file(role)?;
                Some(WorkItem {
                    role,
                    path: file.path.clone(),
                    name: task.display_name(role).unwrap_or_else(|| file.name.clone()),
                })
            })
            .collect();

        if work.is_empty() {
            task.status = TaskStatus::Completed;
            task.completed_time = Some(Utc::now());
            let task = task.clone();
            drop(store);
            tracing::info!(target: "evalcmp.task", task_id = %id, "nothing selected for scoring");
            self.emit(TaskEvent::EvaluationComplete {
                task_id: task.id.clone(),
                task: Box::new(task.clone()),
                results: task.results.clone(),
                statistics: task.statistics.clone(),
                message: Some("没有选择要评测的文件".into()),
            });
            self.emit(TaskEvent::updated(&task));
            return Ok(task);
        }

        let model = teacher_model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.inner.scorer.default_teacher_model.clone());
        let args = self.scorer_args(&model, &work);
        tracing::info!(
            target: "evalcmp.task",
            task_id = %id,
            files = work.len(),
            teacher_model = %model,
            cmd = %args.cmd,
            "starting scorer"
        );

        let session = match self.inner.services.runner.start_session(&args).await {
            Ok(session) => session,
            Err(e) => {
                let message = format!("failed to start scorer: {e}");
                tracing::error!(target: "evalcmp.task", task_id = %id, error = %e, "scorer spawn failed");
                task.status = TaskStatus::Failed;
                task.error = Some(message.clone());
                let task = task.clone();
                drop(store);
                self.emit(TaskEvent::EvaluationError {
                    task_id: task.id.clone(),
                    message,
                });
                self.emit(TaskEvent::updated(&task));
                return Ok(task);
            }
        };
        let task = task.clone();

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = oneshot::channel();
        store.bind(
            id,
            ProcessHandle {
                token,
                roles: work.iter().map(|w| w.role).collect(),
                stop_tx: Some(stop_tx),
            },
        );
        drop(store);

        let input = SuperviseInput {
            session,
            task_id: id.to_string(),
            run_token: token,
            sink: Arc::new(self.clone()),
            stop_rx,
            stop_grace: Duration::from_millis(self.inner.scorer.stop_grace_ms),
            line_channel_capacity: self.inner.scorer.line_channel_capacity,
            stderr_tail_bytes: self.inner.scorer.stderr_tail_bytes,
        };
        let manager = self.clone();
        let task_id = id.to_string();
        tokio::spawn(async move {
            if let Err(e) = supervise(input).await {
                tracing::error!(target: "evalcmp.runner", task_id = %task_id, error = %e, "supervisor failed");
                manager
                    .on_exit(&task_id, token, RunExit::WaitFailed(e.to_string()))
                    .await;
            }
        });

        self.emit(TaskEvent::updated(&task));
        Ok(task)
    }

    /// `[script] <teacher-model> (<path> <name> <role>)*`
    fn scorer_args(&self, model: &str, work: &[WorkItem]) -> RunnerStartArgs {
        let scorer = &self.inner.scorer;
        let mut args = Vec::with_capacity(1 + 1 + work.len() * 3);
        if !scorer.script.trim().is_empty() {
            args.push(scorer.script.clone());
        }
        args.push(model.to_string());
        for item in work {
            args.push(item.path.clone());
            args.push(item.name.clone());
            args.push(item.role.as_str().to_string());
        }
        RunnerStartArgs {
            cmd: scorer.program.clone(),
            args,
            envs: scorer.env.clone(),
            cwd: scorer.working_dir.clone(),
        }
    }

    /// Rows of both sides if the task qualifies for the scorer bypass.
    async fn direct_candidates(&self, task: &Task) -> Option<(Vec<ScoredRow>, Vec<ScoredRow>)> {
        let base = task.base_file.as_ref()?;
        let codec = &self.inner.services.codec;
        let read = async {
            let b = codec.read_rows(Path::new(&base.path)).await?;
            let c = codec.read_rows(Path::new(&task.compare_file.path)).await?;
            Ok::<_, crate::error::SheetError>((b, c))
        };
        match read.await {
            Ok((b, c)) if has_score_column(&b) && has_score_column(&c) => Some((b, c)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    target: "evalcmp.task",
                    task_id = %task.id,
                    error = %e,
                    "could not probe files for existing scores"
                );
                None
            }
        }
    }

    /// 停止评测
    pub async fn stop_evaluation(&self, id: &str) -> Result<Task, TaskError> {
        let task = {
            let mut store = self.inner.store.lock().await;
            let status = store
                .get(id)
                .map(|t| t.status)
                .ok_or_else(|| TaskError::NotFound(format!("task {id}")))?;
            StateTransition::validate(status, TaskStatus::Stopped)?;

            if let Some(handle) = store.unbind(id) {
                if let Some(tx) = handle.stop_tx {
                    let _ = tx.send(());
                }
            }
            let Some(task) = store.get_mut(id) else {
                return Err(TaskError::NotFound(format!("task {id}")));
            };
            task.status = TaskStatus::Stopped;
            task.stopped_time = Some(Utc::now());
            task.clone()
        };
        tracing::info!(target: "evalcmp.task", task_id = %id, "evaluation stopped by user");
        self.emit(TaskEvent::EvaluationStopped {
            task_id: id.to_string(),
            message: "评测已被用户停止".into(),
        });
        self.emit(TaskEvent::updated(&task));
        Ok(task)
    }

    /// 直接对比两个已评分文件，不启动评分进程
    pub async fn direct_comparison(&self, id: &str) -> Result<ComparisonOutcome, TaskError> {
        let task = self.get_task(id).await?;
        if task.is_running() {
            return Err(TaskError::Conflict("task is being evaluated".into()));
        }
        let Some(base) = task.base_file.as_ref() else {
            return Err(TaskError::Validation(
                "direct comparison needs both a base and a compare file".into(),
            ));
        };

        let codec = &self.inner.services.codec;
        let base_rows = codec.read_rows(Path::new(&base.path)).await?;
        let compare_rows = codec.read_rows(Path::new(&task.compare_file.path)).await?;
        if !has_score_column(&base_rows) || !has_score_column(&compare_rows) {
            return Err(TaskError::Validation(
                "both files must contain a score column".into(),
            ));
        }
        self.complete_directly(id, None, base_rows, compare_rows)
            .await
    }

    async fn complete_directly(
        &self,
        id: &str,
        configs: Option<FileConfigs>,
        base_rows: Vec<ScoredRow>,
        compare_rows: Vec<ScoredRow>,
    ) -> Result<ComparisonOutcome, TaskError> {
        let base_stats = compute_statistics(&base_rows);
        let compare_stats = compute_statistics(&compare_rows);

        let task = {
            let mut store = self.inner.store.lock().await;
            let task = store
                .get_mut(id)
                .ok_or_else(|| TaskError::NotFound(format!("task {id}")))?;
            if task.is_running() {
                return Err(TaskError::Conflict("task is being evaluated".into()));
            }

            if let Some(c) = configs {
                task.file_configs = Some(c);
            }
            let results = vec![
                scored_side(task, Role::Base, base_rows, base_stats.clone()),
                scored_side(task, Role::Compare, compare_rows, compare_stats.clone()),
            ];

            task.status = TaskStatus::Completed;
            task.completed_time = Some(Utc::now());
            task.error = None;
            task.results = results;
            task.statistics = vec![base_stats, compare_stats];
            task.clone()
        };

        tracing::info!(target: "evalcmp.task", task_id = %id, "direct comparison completed");
        self.emit(TaskEvent::EvaluationComplete {
            task_id: task.id.clone(),
            task: Box::new(task.clone()),
            results: task.results.clone(),
            statistics: task.statistics.clone(),
            message: Some("直接对比完成".into()),
        });
        self.emit(TaskEvent::updated(&task));
        Ok(ComparisonOutcome {
            results: task.results,
            statistics: task.statistics,
        })
    }

    /// 检查某一侧文件是否已包含评分列
    pub async fn check_score_column(&self, id: &str, role: Role) -> Result<bool, TaskError> {
        let task = self.get_task(id).await?;
        let file = task
            .file(role)
            .ok_or_else(|| TaskError::Validation(format!("task has no {role} file")))?;
        let rows = self
            .inner
            .services
            .codec
            .read_rows(Path::new(&file.path))
            .await?;
        Ok(has_score_column(&rows))
    }

    /// 生成对比报告工作簿并编码为字节
    ///
    /// `required_sides` of 0 accepts any number of results.
    pub async fn export_report(&self, id: &str, required_sides: usize) -> Result<Vec<u8>, TaskError> {
        let task = self.get_task(id).await?;
        let sides_ok = required_sides == 0 || task.results.len() == required_sides;
        if task.status != TaskStatus::Completed || task.results.is_empty() || !sides_ok {
            return Err(TaskError::Validation(
                "task is not completed or lacks comparison results".into(),
            ));
        }
        let codec = self.inner.services.codec.as_ref();
        let workbook = build_report(&task, codec).await?;
        let bytes = codec.encode(&workbook).await?;
        tracing::info!(target: "evalcmp.task", task_id = %id, bytes = bytes.len(), "report exported");
        Ok(bytes)
    }

    /// 保存客户端提交的评测日志文本
    pub async fn save_log(&self, id: &str, transcript: String) -> Result<(), TaskError> {
        let mut store = self.inner.store.lock().await;
        let task = store
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(format!("task {id}")))?;
        task.evaluation_log = transcript;
        Ok(())
    }

    pub async fn progress(&self, id: &str) -> Result<ProgressSnapshot, TaskError> {
        let task = self.get_task(id).await?;
        Ok(ProgressSnapshot {
            task_id: task.id,
            status: task.status,
            base_progress: task.base_progress,
            compare_progress: task.compare_progress,
            results: task.results,
        })
    }

    async fn apply_event(&self, task_id: &str, token: u64, event: ProgressEvent) {
        let mut store = self.inner.store.lock().await;
        let Some(files) = store.bound(task_id, token).map(|h| h.file_count()) else {
            tracing::debug!(target: "evalcmp.task", task_id = %task_id, "discarding event from unbound run");
            return;
        };
        let Some(task) = store.get_mut(task_id).filter(|t| t.is_running()) else {
            return;
        };

        match event {
            ProgressEvent::Progress(update) => {
                if let Some(role) = update.role {
                    task.set_progress(role, update.percent);
                }
                let overall = overall_progress(
                    task.base_progress,
                    task.compare_progress,
                    files,
                    update.current,
                    update.total,
                );
                if let Some(output) = update.model_output.as_ref() {
                    task.model_outputs.push(ModelOutput {
                        timestamp: Utc::now(),
                        role: update.role,
                        output: output.clone(),
                    });
                }
                let payload = ProgressPayload {
                    task_id: task_id.to_string(),
                    base_progress: task.base_progress,
                    compare_progress: task.compare_progress,
                    overall_progress: overall.percent,
                    overall_current: overall.current,
                    overall_total: overall.total,
                    model_output: update.model_output,
                    elapsed_time: update.elapsed_time,
                    current_question: update.current.filter(|c| *c > 0),
                    total_questions: update.total.filter(|t| *t > 0),
                    ..ProgressPayload::default()
                };
                drop(store);
                self.emit(TaskEvent::EvaluationProgress(payload));
            }
            ProgressEvent::FileCompleted(done) => {
                tracing::info!(
                    target: "evalcmp.task",
                    task_id = %task_id,
                    file = done.file.as_deref().unwrap_or("?"),
                    total_time = done.total_time.unwrap_or_default(),
                    "file scored"
                );
                let overall = overall_progress(
                    task.base_progress,
                    task.compare_progress,
                    files,
                    None,
                    None,
                );
                let payload = ProgressPayload {
                    task_id: task_id.to_string(),
                    base_progress: task.base_progress,
                    compare_progress: task.compare_progress,
                    overall_progress: overall.percent,
                    file_completed: done.file,
                    total_time: done.total_time,
                    message: done.message,
                    ..ProgressPayload::default()
                };
                drop(store);
                self.emit(TaskEvent::EvaluationProgress(payload));
            }
            ProgressEvent::Log { message, severity } => {
                append_bounded(
                    &mut task.evaluation_log,
                    &message,
                    self.inner.transcript_max_bytes,
                );
                drop(store);
                if severity == LogSeverity::Error {
                    tracing::warn!(target: "evalcmp.scorer", task_id = %task_id, line = %message, "scorer stderr");
                }
                self.emit(TaskEvent::EvaluationLog {
                    task_id: task_id.to_string(),
                    message,
                    severity,
                });
            }
            ProgressEvent::RunError { message } => {
                task.status = TaskStatus::Failed;
                task.error = Some(message.clone());
                let task = task.clone();
                store.unbind(task_id);
                drop(store);
                tracing::error!(target: "evalcmp.task", task_id = %task_id, error = %message, "scorer reported an error");
                self.emit(TaskEvent::EvaluationError {
                    task_id: task_id.to_string(),
                    message,
                });
                self.emit(TaskEvent::updated(&task));
            }
            // handled by complete_run
            ProgressEvent::RunComplete(_) => {}
        }
    }

    async fn complete_run(&self, task_id: &str, token: u64, done: RunComplete) {
        let snapshot = {
            let store = self.inner.store.lock().await;
            if store.bound(task_id, token).is_none() {
                tracing::debug!(target: "evalcmp.task", task_id = %task_id, "discarding completion from unbound run");
                return;
            }
            match store.get(task_id).filter(|t| t.is_running()) {
                Some(t) => t.clone(),
                None => return,
            }
        };

        let codec = self.inner.services.codec.as_ref();
        let folded = complete::fold_completion(&snapshot, done, codec).await;
        let output_paths =
            complete::persist_model_outputs(&snapshot, &self.inner.model_output_dir).await;

        let task = {
            let mut store = self.inner.store.lock().await;
            if store.bound(task_id, token).is_none() {
                tracing::debug!(target: "evalcmp.task", task_id = %task_id, "run unbound while folding results");
                return;
            }
            store.unbind(task_id);
            let Some(task) = store.get_mut(task_id) else {
                return;
            };
            task.results = folded.results;
            task.statistics = folded.statistics;
            task.model_output_paths = output_paths;
            task.status = TaskStatus::Completed;
            task.completed_time = Some(Utc::now());
            task.clone()
        };

        tracing::info!(
            target: "evalcmp.task",
            task_id = %task_id,
            results = task.results.len(),
            "evaluation completed"
        );
        self.emit(TaskEvent::EvaluationComplete {
            task_id: task_id.to_string(),
            task: Box::new(task.clone()),
            results: task.results.clone(),
            statistics: task.statistics.clone(),
            message: None,
        });
        self.emit(TaskEvent::updated(&task));

        let registered = complete::register_artifacts(
            &task,
            &folded.reported,
            codec,
            self.inner.services.catalog.as_ref(),
        )
        .await;
        if registered > 0 {
            tracing::info!(target: "evalcmp.catalog", task_id = %task_id, registered, "completed files registered");
        }
    }
}

fn scored_side(
    task: &Task,
    role: Role,
    rows: Vec<ScoredRow>,
    stats: crate::stats::StatisticsSummary,
) -> FileResult {
    FileResult {
        role: Some(role),
        name: task.file(role).map(|f| f.name.clone()),
        file_name: task.display_name(role),
        data: Some(rows),
        statistics: Some(stats),
        ..FileResult::default()
    }
}

#[async_trait]
impl RunEventSink for TaskManager {
    async fn on_event(&self, task_id: &str, run_token: u64, event: ProgressEvent) {
        match event {
            ProgressEvent::RunComplete(done) => self.complete_run(task_id, run_token, done).await,
            other => self.apply_event(task_id, run_token, other).await,
        }
    }

    async fn on_exit(&self, task_id: &str, run_token: u64, exit: RunExit) {
        let task = {
            let mut store = self.inner.store.lock().await;
            if store.bound(task_id, run_token).is_none() {
                return;
            }
            store.unbind(task_id);
            let Some(task) = store.get_mut(task_id).filter(|t| t.is_running()) else {
                return;
            };

            let message = match exit {
                RunExit::Exited {
                    outcome,
                    stderr_tail,
                } => {
                    if outcome.exit_code != 0 {
                        tracing::error!(
                            target: "evalcmp.task",
                            task_id = %task_id,
                            exit_code = outcome.exit_code,
                            stderr_tail = %stderr_tail,
                            "scorer exited abnormally"
                        );
                        format!("评测进程异常退出，退出码: {}", outcome.exit_code)
                    } else {
                        tracing::error!(target: "evalcmp.task", task_id = %task_id, "scorer exited without reporting results");
                        "scorer exited without reporting results".to_string()
                    }
                }
                RunExit::Stopped { .. } => "scorer was stopped".to_string(),
                RunExit::WaitFailed(e) => format!("scorer failed: {e}"),
            };
            task.status = TaskStatus::Failed;
            task.error = Some(message);
            task.clone()
        };

        self.emit(TaskEvent::EvaluationError {
            task_id: task_id.to_string(),
            message: task.error.clone().unwrap_or_default(),
        });
        self.emit(TaskEvent::updated(&task));
    }
}

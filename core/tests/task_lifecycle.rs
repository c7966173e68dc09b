mod common;

use std::time::Duration;

use common::{harness, harness_with, next_event, row, scored_row, wait_for_status, Harness};
use evalcmp_core::api::{
    CompletedFile, FileConfig, FileConfigs, FileOrigin, FileSource, NewTask, Role, Signal,
    TaskErrorKind, TaskEvent, TaskStatus,
};
use pretty_assertions::assert_eq;

const BASE: &str = "/data/base.xlsx";
const CMP: &str = "/data/cmp.xlsx";

fn uploaded(path: &str) -> Option<FileSource> {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    Some(FileSource::Uploaded {
        path: path.to_string(),
        name,
    })
}

fn new_task(base: Option<&str>, compare: &str) -> NewTask {
    NewTask {
        name: "nightly".into(),
        submitter: "alice".into(),
        base: base.and_then(uploaded),
        compare: uploaded(compare),
    }
}

fn configs(base: bool, compare: bool) -> FileConfigs {
    FileConfigs {
        base_file: FileConfig {
            evaluate: base,
            name: String::new(),
        },
        compare_file: FileConfig {
            evaluate: compare,
            name: String::new(),
        },
    }
}

async fn running_compare_only(h: &mut Harness) -> String {
    h.codec.put(CMP, vec![row(1, "A", "A1"), row(2, "A", "A1")]);
    let task = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let started = h
        .manager
        .start_evaluation(&task.id, configs(false, true), None)
        .await
        .unwrap();
    assert_eq!(started.status, TaskStatus::Running);
    task.id
}

#[tokio::test]
async fn create_requires_name_submitter_and_compare() {
    let h = harness();
    h.codec.put(CMP, vec![row(1, "A", "A1")]);

    let mut nt = new_task(None, CMP);
    nt.name = "  ".into();
    let err = h.manager.create_task(nt).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);

    let mut nt = new_task(None, CMP);
    nt.compare = None;
    let err = h.manager.create_task(nt).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);

    assert!(h.manager.list_tasks().await.is_empty());
}

#[tokio::test]
async fn create_rejects_uploads_without_required_columns() {
    let h = harness();
    let mut broken = row(1, "A", "A1").into_map();
    broken.remove("model_ans");
    h.codec.put(CMP, vec![broken.into()]);

    let err = h.manager.create_task(new_task(None, CMP)).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);
    assert!(err.to_string().contains("model_ans"), "{err}");

    let err = h
        .manager
        .create_task(new_task(None, "/data/missing.xlsx"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::NotFound);
}

#[tokio::test]
async fn create_resolves_catalog_entries() {
    let h = harness();
    h.catalog.entries.lock().unwrap().push(CompletedFile {
        id: "c1".into(),
        name: "scored.xlsx".into(),
        original_name: "scored.xlsx".into(),
        file_path: "/completed/scored.xlsx".into(),
        submitter: "bob".into(),
        upload_time: chrono::Utc::now(),
        task_id: None,
        role: "compare".into(),
        size: Some(10),
        score_stats: None,
    });

    let mut rx = h.manager.subscribe();
    let task = h
        .manager
        .create_task(NewTask {
            name: "from catalog".into(),
            submitter: "alice".into(),
            base: None,
            compare: Some(FileSource::Catalog { id: "c1".into() }),
        })
        .await
        .unwrap();
    assert_eq!(task.compare_file.origin, FileOrigin::Catalog);
    assert_eq!(task.compare_file.path, "/completed/scored.xlsx");
    assert_eq!(task.compare_file.catalog_id.as_deref(), Some("c1"));
    assert_eq!(task.status, TaskStatus::Pending);

    let ev = next_event(&mut rx, "taskCreated").await;
    assert_eq!(ev.task_id(), task.id);

    let err = h
        .manager
        .create_task(NewTask {
            name: "x".into(),
            submitter: "y".into(),
            base: None,
            compare: Some(FileSource::Catalog { id: "nope".into() }),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::NotFound);
}

#[tokio::test]
async fn nothing_selected_completes_without_a_scorer() {
    let mut h = harness();
    h.codec.put(BASE, vec![row(1, "A", "A1")]);
    h.codec.put(CMP, vec![row(1, "A", "A1")]);
    let task = h.manager.create_task(new_task(Some(BASE), CMP)).await.unwrap();
    let mut rx = h.manager.subscribe();

    let done = h
        .manager
        .start_evaluation(&task.id, FileConfigs::default(), None)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.completed_time.is_some());

    match next_event(&mut rx, "evaluationComplete").await {
        TaskEvent::EvaluationComplete { message, .. } => {
            assert_eq!(message.as_deref(), Some("没有选择要评测的文件"))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(h.controls.try_recv().is_err());
}

#[tokio::test]
async fn scored_files_bypass_the_scorer() {
    let mut h = harness();
    h.codec.put(BASE, vec![scored_row(1, "A", "A1", 0.5)]);
    h.codec.put(CMP, vec![scored_row(1, "A", "A1", 0.7)]);
    let task = h.manager.create_task(new_task(Some(BASE), CMP)).await.unwrap();

    let done = h
        .manager
        .start_evaluation(&task.id, configs(true, true), Some("Qwen".into()))
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.results.len(), 2);
    assert_eq!(done.results[0].role, Some(Role::Base));
    assert_eq!(done.results[1].role, Some(Role::Compare));
    assert_eq!(done.statistics.len(), 2);
    assert!((done.statistics[1].overall.average_score - 0.7).abs() < 1e-9);
    assert!(h.controls.try_recv().is_err());
}

#[tokio::test]
async fn direct_comparison_needs_two_scored_files() {
    let h = harness();
    h.codec.put(BASE, vec![scored_row(1, "A", "A1", 1.0)]);
    h.codec.put(CMP, vec![row(1, "A", "A1")]);

    let pair = h.manager.create_task(new_task(Some(BASE), CMP)).await.unwrap();
    let err = h.manager.direct_comparison(&pair.id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);

    let single = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let err = h.manager.direct_comparison(&single.id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);

    assert!(h.manager.check_score_column(&pair.id, Role::Base).await.unwrap());
    assert!(!h.manager.check_score_column(&pair.id, Role::Compare).await.unwrap());
    let err = h
        .manager
        .check_score_column(&single.id, Role::Base)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);
}

#[tokio::test]
async fn scorer_complete_record_finishes_the_task() {
    let mut h = harness();
    h.codec.put(
        CMP,
        vec![
            scored_row(1, "A", "A1", 80.0),
            scored_row(2, "A", "A1", 60.0),
        ],
    );
    let task = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let mut rx = h.manager.subscribe();
    h.manager
        .start_evaluation(&task.id, configs(false, true), None)
        .await
        .unwrap();

    let mut ctl = h.next_control().await;
    assert_eq!(ctl.args.cmd, "python");
    assert_eq!(
        ctl.args.args,
        vec!["eval_service.py", "Deepseek", CMP, "cmp.xlsx", "compare"]
    );

    ctl.stdout_line(r#"{"type":"complete","statistics":[{"overall":{"average_score":70,"max_score":80,"min_score":60,"total_questions":2}}]}"#)
        .await;
    let ev = next_event(&mut rx, "evaluationComplete").await;
    assert_eq!(ev.task_id(), task.id);
    ctl.finish(0);

    let done = h.manager.get_task(&task.id).await.unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.statistics[0].overall.average_score, 70.0);

    // The clean exit that follows must not flip the task to failed.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        h.manager.get_task(&task.id).await.unwrap().status,
        TaskStatus::Completed
    );
}

#[tokio::test]
async fn unscored_base_is_folded_into_results() {
    let mut h = harness();
    h.codec.put(BASE, vec![row(1, "A", "A1"), row(2, "B", "B1")]);
    h.codec.put(CMP, vec![row(1, "A", "A1"), row(2, "B", "B1")]);
    let task = h.manager.create_task(new_task(Some(BASE), CMP)).await.unwrap();
    h.manager
        .start_evaluation(&task.id, configs(false, true), None)
        .await
        .unwrap();

    let mut ctl = h.next_control().await;
    ctl.stdout_line(r#"{"type":"complete","results":[{"fileName":"cmp.xlsx","statistics":{"overall":{"average_score":0.5,"max_score":1,"min_score":0,"total_questions":2}}}]}"#)
        .await;
    ctl.finish(0);
    wait_for_status(&h.manager, &task.id, TaskStatus::Completed).await;

    let done = h.manager.get_task(&task.id).await.unwrap();
    assert_eq!(done.results.len(), 2);
    assert_eq!(done.results[0].role, Some(Role::Base));
    assert_eq!(done.results[0].has_score_data, Some(false));
    assert_eq!(done.results[0].total_questions, Some(2));
    // role inferred from the file name
    assert_eq!(done.results[1].role, Some(Role::Compare));
    assert_eq!(done.statistics.len(), 2);
    assert_eq!(done.statistics[0].has_score_data, Some(false));
    assert_eq!(done.statistics[0].overall.total_questions, 2);
}

#[tokio::test]
async fn scored_outputs_are_registered_in_the_catalog() {
    let mut h = harness();
    let output = h.dir.path().join("cmp_scored.xlsx");
    std::fs::write(&output, b"xlsx").unwrap();
    h.codec.put(
        output.clone(),
        vec![scored_row(1, "A", "A1", 90.0), scored_row(2, "A", "A1", 30.0)],
    );

    let id = running_compare_only(&mut h).await;
    let mut ctl = h.next_control().await;
    let line = serde_json::json!({
        "type": "complete",
        "results": [{"fileName": "cmp.xlsx", "outputPath": output.display().to_string()}]
    });
    ctl.stdout_line(&line.to_string()).await;
    ctl.finish(0);
    wait_for_status(&h.manager, &id, TaskStatus::Completed).await;

    let fut = async {
        loop {
            if let Some(entry) = h.catalog.entries.lock().unwrap().first().cloned() {
                return entry;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    let entry = tokio::time::timeout(Duration::from_secs(5), fut).await.unwrap();
    assert_eq!(entry.name, "cmp.xlsx");
    assert_eq!(entry.role, "compare");
    assert_eq!(entry.task_id.as_deref(), Some(id.as_str()));
    assert_eq!(entry.size, Some(4));
    let stats = entry.score_stats.unwrap();
    assert_eq!(stats.scored_questions, 2);
    assert_eq!(stats.average_score, 60.0);
}

#[tokio::test]
async fn nonzero_exit_fails_and_reevaluation_resets_progress() {
    let mut h = harness();
    let id = running_compare_only(&mut h).await;
    let mut rx = h.manager.subscribe();

    let mut ctl = h.next_control().await;
    ctl.stdout_line(r#"{"type":"progress","file":"file2","progress":40}"#)
        .await;
    next_event(&mut rx, "evaluationProgress").await;
    ctl.finish(2);

    match next_event(&mut rx, "evaluationError").await {
        TaskEvent::EvaluationError { message, .. } => assert!(message.contains('2'), "{message}"),
        other => panic!("unexpected {other:?}"),
    }
    let failed = h.manager.get_task(&id).await.unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.compare_progress, 40.0);
    assert!(failed.error.is_some());

    let again = h
        .manager
        .start_evaluation(&id, configs(false, true), None)
        .await
        .unwrap();
    assert_eq!(again.status, TaskStatus::Running);
    assert_eq!(again.compare_progress, 0.0);
    assert_eq!(again.base_progress, 0.0);
    assert!(again.error.is_none());
    let _ctl = h.next_control().await;
}

#[tokio::test]
async fn reevaluating_a_completed_task_starts_from_zero() {
    let mut h = harness();
    let id = running_compare_only(&mut h).await;
    let mut rx = h.manager.subscribe();

    let mut ctl = h.next_control().await;
    ctl.stdout_line(r#"{"type":"progress","file":"compare","progress":75,"modelOutput":"first pass"}"#)
        .await;
    next_event(&mut rx, "evaluationProgress").await;
    ctl.stdout_line(r#"{"type":"complete","statistics":[{"overall":{"average_score":1,"max_score":1,"min_score":1,"total_questions":2}}]}"#)
        .await;
    ctl.finish(0);
    wait_for_status(&h.manager, &id, TaskStatus::Completed).await;

    let done = h.manager.get_task(&id).await.unwrap();
    assert!(done.compare_progress > 0.0);
    assert_eq!(done.statistics.len(), 1);
    assert!(done.model_output_paths.contains_key(&Role::Compare));

    let again = h
        .manager
        .start_evaluation(&id, configs(false, true), None)
        .await
        .unwrap();
    assert_eq!(again.status, TaskStatus::Running);
    assert_eq!(again.compare_progress, 0.0);
    assert_eq!(again.base_progress, 0.0);
    assert!(again.statistics.is_empty());
    assert!(again.model_outputs.is_empty());
    assert!(again.model_output_paths.is_empty());
    assert!(again.completed_time.is_none());

    let progress = h.manager.progress(&id).await.unwrap();
    assert_eq!(progress.compare_progress, 0.0);
    let _ctl = h.next_control().await;
}

#[tokio::test]
async fn deleting_a_completed_task_removes_it_from_the_list() {
    let h = harness();
    h.codec.put(CMP, vec![row(1, "A", "A1")]);
    let keep = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let task = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let done = h
        .manager
        .start_evaluation(&task.id, configs(false, false), None)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);

    h.manager.delete_task(&task.id).await.unwrap();
    let ids: Vec<String> = h.manager.list_tasks().await.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![keep.id]);
}

#[tokio::test]
async fn clean_exit_without_results_fails() {
    let mut h = harness();
    let id = running_compare_only(&mut h).await;
    let ctl = h.next_control().await;
    ctl.finish(0);
    wait_for_status(&h.manager, &id, TaskStatus::Failed).await;
    let task = h.manager.get_task(&id).await.unwrap();
    assert!(task.error.unwrap().contains("without reporting results"));
}

#[tokio::test]
async fn scorer_error_record_fails_the_task() {
    let mut h = harness();
    let id = running_compare_only(&mut h).await;
    let mut rx = h.manager.subscribe();
    let mut ctl = h.next_control().await;
    ctl.stdout_line(r#"{"type":"error","message":"model quota exhausted"}"#)
        .await;

    match next_event(&mut rx, "evaluationError").await {
        TaskEvent::EvaluationError { message, .. } => assert_eq!(message, "model quota exhausted"),
        other => panic!("unexpected {other:?}"),
    }
    let task = h.manager.get_task(&id).await.unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    ctl.finish(1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        h.manager.get_task(&id).await.unwrap().error.as_deref(),
        Some("model quota exhausted")
    );
}

#[tokio::test]
async fn spawn_failure_marks_the_task_failed() {
    let h = harness_with(|r| r.fail_spawn = true);
    h.codec.put(CMP, vec![row(1, "A", "A1")]);
    let task = h.manager.create_task(new_task(None, CMP)).await.unwrap();
    let out = h
        .manager
        .start_evaluation(&task.id, configs(false, true), None)
        .await
        .unwrap();
    assert_eq!(out.status, TaskStatus::Failed);
    assert!(out.error.unwrap().contains("failed to start scorer"));
    assert_eq!(h.manager.running_count().await, 0);
}

#[tokio::test]
async fn stop_escalates_to_kill_when_term_is_ignored() {
    let mut h = harness_with(|r| r.ignore_term = true);
    let id = running_compare_only(&mut h).await;
    let ctl = h.next_control().await;
    let mut rx = h.manager.subscribe();

    let stopped = h.manager.stop_evaluation(&id).await.unwrap();
    assert_eq!(stopped.status, TaskStatus::Stopped);
    assert!(stopped.stopped_time.is_some());
    match next_event(&mut rx, "evaluationStopped").await {
        TaskEvent::EvaluationStopped { message, .. } => assert_eq!(message, "评测已被用户停止"),
        other => panic!("unexpected {other:?}"),
    }

    let fut = async {
        loop {
            if ctl.signals().contains(&Signal::Kill) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("kill was never sent");
    assert_eq!(ctl.signals(), vec![Signal::Term, Signal::Kill]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        h.manager.get_task(&id).await.unwrap().status,
        TaskStatus::Stopped
    );
    assert_eq!(h.manager.running_count().await, 0);
}

#[tokio::test]
async fn running_tasks_cannot_be_deleted_or_restarted() {
    let mut h = harness();
    let id = running_compare_only(&mut h).await;
    let _ctl = h.next_control().await;

    let err = h.manager.delete_task(&id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Conflict);
    let err = h
        .manager
        .start_evaluation(&id, configs(false, true), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Conflict);
    let err = h.manager.direct_comparison(&id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Conflict);

    h.manager.stop_evaluation(&id).await.unwrap();
    let err = h.manager.stop_evaluation(&id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Conflict);

    let mut rx = h.manager.subscribe();
    h.manager.delete_task(&id).await.unwrap();
    next_event(&mut rx, "taskDeleted").await;
    let err = h.manager.get_task(&id).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::NotFound);
}

#[tokio::test]
async fn report_export_requires_a_completed_pair() {
    let h = harness();
    h.codec.put(BASE, vec![scored_row(1, "A", "A1", 0.5)]);
    h.codec.put(CMP, vec![scored_row(1, "A", "A1", 0.7)]);
    let task = h.manager.create_task(new_task(Some(BASE), CMP)).await.unwrap();

    let err = h.manager.export_report(&task.id, 2).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::Validation);

    h.manager.direct_comparison(&task.id).await.unwrap();
    let bytes = h.manager.export_report(&task.id, 2).await.unwrap();
    assert!(!bytes.is_empty());

    let wb = h.codec.last_encoded().unwrap();
    let overview = wb.sheet("概览对比").unwrap();
    assert_eq!(overview.text_at(0, 0).as_deref(), Some("模型评测对比报告"));
    assert!(wb.sheet("详细对比数据").is_some());
}

#[tokio::test]
async fn save_log_and_progress_snapshot() {
    let h = harness();
    h.codec.put(CMP, vec![row(1, "A", "A1")]);
    let task = h.manager.create_task(new_task(None, CMP)).await.unwrap();

    h.manager
        .save_log(&task.id, "line one\nline two".into())
        .await
        .unwrap();
    assert_eq!(
        h.manager.get_task(&task.id).await.unwrap().evaluation_log,
        "line one\nline two"
    );

    let snap = h.manager.progress(&task.id).await.unwrap();
    assert_eq!(snap.status, TaskStatus::Pending);
    assert_eq!(snap.compare_progress, 0.0);

    let err = h.manager.save_log("ghost", String::new()).await.unwrap_err();
    assert_eq!(err.kind(), TaskErrorKind::NotFound);
}

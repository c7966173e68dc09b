//! 评测完成时的结果折叠：补齐未参与评测的一侧、推断结果角色、登记已完成文件、保存模型输出

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{Catalog, CompletedFile};
use crate::progress::RunComplete;
use crate::sheet::{has_score_column, SheetCodec};
use crate::stats::{compute_statistics, placeholder_summary, score_stats, StatisticsSummary};

use super::types::{FileRef, FileResult, Role, Task};

#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// `[base, compare]`-ordered results including synthesized sides.
    pub results: Vec<FileResult>,
    /// Parallel to `results` when every result carried statistics.
    pub statistics: Vec<StatisticsSummary>,
    /// Only what the scorer produced, with roles inferred.
    pub reported: Vec<FileResult>,
}

pub async fn fold_completion(task: &Task, done: RunComplete, codec: &dyn SheetCodec) -> Completion {
    let mut reported = done.results.clone().unwrap_or_default();
    infer_roles(task, &mut reported);

    let mut results = reported.clone();
    let mut statistics: Vec<StatisticsSummary> = match done.results {
        Some(rs) => rs.into_iter().filter_map(|r| r.statistics).collect(),
        None => done.statistics.unwrap_or_default(),
    };

    if let Some(configs) = task.file_configs.as_ref() {
        for role in Role::ALL {
            if configs.get(role).evaluate {
                continue;
            }
            let Some(file) = task.file(role) else {
                continue;
            };
            match synthesize_side(task, role, file, codec).await {
                Ok((result, stats)) => match role {
                    Role::Base => {
                        results.insert(0, result);
                        statistics.insert(0, stats);
                    }
                    Role::Compare => {
                        results.push(result);
                        statistics.push(stats);
                    }
                },
                Err(e) => tracing::warn!(
                    target: "evalcmp.task",
                    task_id = %task.id,
                    role = %role,
                    error = %e,
                    "could not read unscored side"
                ),
            }
        }
    }

    Completion {
        results,
        statistics,
        reported,
    }
}

/// Result for a side that skipped scoring, read straight from its file.
async fn synthesize_side(
    task: &Task,
    role: Role,
    file: &FileRef,
    codec: &dyn SheetCodec,
) -> Result<(FileResult, StatisticsSummary), crate::error::SheetError> {
    let rows = codec.read_rows(Path::new(&file.path)).await?;
    let scored = has_score_column(&rows);
    let stats = if scored {
        compute_statistics(&rows)
    } else {
        placeholder_summary(rows.len())
    };
    let result = FileResult {
        role: Some(role),
        file_name: task.display_name(role),
        output_path: Some(file.path.clone()),
        statistics: Some(stats.clone()),
        total_questions: Some(rows.len()),
        has_score_data: (!scored).then_some(false),
        ..FileResult::default()
    };
    Ok((result, stats))
}

/// Tag results lacking a `type` by matching `fileName` against each side's
/// file name or configured display name.
pub fn infer_roles(task: &Task, results: &mut [FileResult]) {
    for r in results.iter_mut().filter(|r| r.role.is_none()) {
        let Some(name) = r.file_name.as_deref() else {
            continue;
        };
        r.role = Role::ALL.into_iter().find(|role| {
            let file_match = task.file(*role).map(|f| f.name == name).unwrap_or(false);
            let config_match = task
                .file_configs
                .as_ref()
                .map(|c| c.get(*role).name == name)
                .unwrap_or(false);
            task.file(*role).is_some() && (file_match || config_match)
        });
    }
}

/// Register freshly scored outputs in the catalog. Skips missing outputs and
/// sides whose original file was already scored. Returns how many entries
/// were written.
pub async fn register_artifacts(
    task: &Task,
    reported: &[FileResult],
    codec: &dyn SheetCodec,
    catalog: &dyn Catalog,
) -> usize {
    let mut written = 0;
    for res in reported {
        let Some(output) = res.output_path.as_deref() else {
            continue;
        };
        if !Path::new(output).exists() {
            continue;
        }

        if let Some(original) = res.role.and_then(|r| task.file(r)) {
            if Path::new(&original.path).exists() {
                match codec.read_rows(Path::new(&original.path)).await {
                    Ok(rows) if has_score_column(&rows) => {
                        tracing::info!(
                            target: "evalcmp.catalog",
                            task_id = %task.id,
                            path = %original.path,
                            "original already scored, not cataloguing"
                        );
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        target: "evalcmp.catalog",
                        path = %original.path,
                        error = %e,
                        "could not inspect original file"
                    ),
                }
            }
        }

        let stats = match codec.read_rows(Path::new(output)).await {
            Ok(rows) => score_stats(&rows),
            Err(e) => {
                tracing::warn!(target: "evalcmp.catalog", path = %output, error = %e, "could not read scored output");
                None
            }
        };
        let size = match tokio::fs::metadata(output).await {
            Ok(m) => Some(m.len()),
            Err(e) => {
                tracing::warn!(target: "evalcmp.catalog", path = %output, error = %e, "could not stat scored output");
                None
            }
        };

        let name = res.file_name.clone().unwrap_or_default();
        let entry = CompletedFile {
            id: Uuid::new_v4().to_string(),
            name: name.clone(),
            original_name: name,
            file_path: output.to_string(),
            submitter: task.submitter.clone(),
            upload_time: Utc::now(),
            task_id: Some(task.id.clone()),
            role: res
                .role
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            size,
            score_stats: stats,
        };
        match catalog.upsert_by_name(entry).await {
            Ok(()) => written += 1,
            Err(e) => tracing::error!(
                target: "evalcmp.catalog",
                task_id = %task.id,
                error = %e,
                "failed to register completed file"
            ),
        }
    }
    written
}

#[derive(Serialize)]
struct OutputLine<'a> {
    timestamp: String,
    output: &'a str,
}

/// Write accumulated model outputs as `<task>_<role>_outputs.jsonl` under
/// `dir`. Returns the written path per role.
pub async fn persist_model_outputs(task: &Task, dir: &Path) -> BTreeMap<Role, String> {
    let mut paths = BTreeMap::new();
    if task.model_outputs.is_empty() {
        return paths;
    }
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(target: "evalcmp.task", dir = %dir.display(), error = %e, "cannot create model output dir");
        return paths;
    }

    for role in Role::ALL {
        let lines: Vec<String> = task
            .model_outputs
            .iter()
            .filter(|o| o.role == Some(role))
            .filter_map(|o| {
                serde_json::to_string(&OutputLine {
                    timestamp: o.timestamp.to_rfc3339(),
                    output: &o.output,
                })
                .ok()
            })
            .collect();
        if lines.is_empty() {
            continue;
        }
        let path = dir.join(format!("{}_{}_outputs.jsonl", task.id, role.as_str()));
        match tokio::fs::write(&path, lines.join("\n")).await {
            Ok(()) => {
                paths.insert(role, path.to_string_lossy().to_string());
            }
            Err(e) => tracing::warn!(
                target: "evalcmp.task",
                path = %path.display(),
                error = %e,
                "failed to save model outputs"
            ),
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::types::{FileConfig, FileConfigs, FileOrigin, ModelOutput};

    fn file(name: &str) -> FileRef {
        FileRef {
            path: format!("/nonexistent/{name}"),
            name: name.to_string(),
            origin: FileOrigin::Uploaded,
            catalog_id: None,
        }
    }

    fn task() -> Task {
        let mut t = Task::new(
            "t1".into(),
            "n".into(),
            "alice".into(),
            Some(file("base.xlsx")),
            file("cmp.xlsx"),
        );
        t.file_configs = Some(FileConfigs {
            base_file: FileConfig {
                evaluate: true,
                name: "Qwen".into(),
            },
            compare_file: FileConfig {
                evaluate: true,
                name: String::new(),
            },
        });
        t
    }

    #[test]
    fn infers_roles_from_names() {
        let t = task();
        let mut rs = vec![
            FileResult {
                file_name: Some("cmp.xlsx".into()),
                ..Default::default()
            },
            FileResult {
                file_name: Some("Qwen".into()),
                ..Default::default()
            },
            FileResult {
                file_name: Some("other".into()),
                ..Default::default()
            },
            FileResult {
                file_name: Some("cmp.xlsx".into()),
                role: Some(Role::Base),
                ..Default::default()
            },
        ];
        infer_roles(&t, &mut rs);
        assert_eq!(rs[0].role, Some(Role::Compare));
        assert_eq!(rs[1].role, Some(Role::Base));
        assert_eq!(rs[2].role, None);
        assert_eq!(rs[3].role, Some(Role::Base));
    }

    #[tokio::test]
    async fn persists_outputs_per_role() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = task();
        for (role, text) in [
            (Some(Role::Base), "a"),
            (Some(Role::Base), "b"),
            (None, "lost"),
        ] {
            t.model_outputs.push(ModelOutput {
                timestamp: Utc::now(),
                role,
                output: text.into(),
            });
        }
        let paths = persist_model_outputs(&t, dir.path()).await;
        assert_eq!(paths.len(), 1);
        let body = std::fs::read_to_string(&paths[&Role::Base]).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"output\":\"b\""));
    }
}

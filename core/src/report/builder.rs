use std::path::Path;

use crate::error::TaskError;
use crate::sheet::{ScoredRow, SheetCodec, Workbook};
use crate::state::{FileResult, Role, Task};
use crate::stats::{compute_statistics, StatisticsSummary};

use super::detail::write_detail_sheet;
use super::overview::write_overview_sheet;

/// 报告中的一侧：显示名、数据行与统计
#[derive(Debug, Clone)]
pub struct ReportSide {
    pub name: String,
    pub rows: Vec<ScoredRow>,
    pub stats: StatisticsSummary,
}

/// Build the comparison workbook for a finished task.
///
/// Needs at least one result tagged base or compare. Each side reads its
/// scored output, falling back to the task's original file when the output
/// is gone. Statistics come from `task.statistics` when present.
pub async fn build_report(task: &Task, codec: &dyn SheetCodec) -> Result<Workbook, TaskError> {
    let base_result = find_result(task, Role::Base);
    let compare_result = find_result(task, Role::Compare);
    if base_result.is_none() && compare_result.is_none() {
        return Err(TaskError::MissingResults);
    }

    let base = match base_result {
        Some(r) => Some(load_side(task, Role::Base, r, 0, codec).await?),
        None => None,
    };
    let stats_index = if base.is_some() { 1 } else { 0 };
    let compare = match compare_result {
        Some(r) => Some(load_side(task, Role::Compare, r, stats_index, codec).await?),
        None => None,
    };

    tracing::info!(
        target: "evalcmp.report",
        task_id = %task.id,
        base_rows = base.as_ref().map(|s| s.rows.len()).unwrap_or(0),
        compare_rows = compare.as_ref().map(|s| s.rows.len()).unwrap_or(0),
        "building report"
    );

    let mut workbook = Workbook::new();
    workbook.push(write_overview_sheet(base.as_ref(), compare.as_ref()));
    workbook.push(write_detail_sheet(base.as_ref(), compare.as_ref()));
    Ok(workbook)
}

fn find_result(task: &Task, role: Role) -> Option<&FileResult> {
    task.results.iter().find(|r| r.role == Some(role))
}

async fn load_side(
    task: &Task,
    role: Role,
    result: &FileResult,
    stats_index: usize,
    codec: &dyn SheetCodec,
) -> Result<ReportSide, TaskError> {
    let output = result
        .output_path
        .as_deref()
        .filter(|p| Path::new(p).exists());
    let path = match (output, task.file(role)) {
        (Some(p), _) => p.to_string(),
        (None, Some(original)) => original.path.clone(),
        (None, None) => {
            return Err(TaskError::FileMissing(
                result.output_path.clone().unwrap_or_default().into(),
            ))
        }
    };
    let rows = codec.read_rows(Path::new(&path)).await?;

    let stats = match task.statistics.get(stats_index) {
        Some(s) => s.clone(),
        None => compute_statistics(&rows),
    };

    Ok(ReportSide {
        name: side_name(task, role, result),
        rows,
        stats,
    })
}

/// Configured name, then the result's file name, then a generic label.
fn side_name(task: &Task, role: Role, result: &FileResult) -> String {
    let configured = task
        .file_configs
        .as_ref()
        .map(|c| c.get(role).name.trim().to_string())
        .filter(|n| !n.is_empty());
    configured
        .or_else(|| result.file_name.clone().filter(|n| !n.is_empty()))
        .unwrap_or_else(|| match role {
            Role::Base => "Base模型".to_string(),
            Role::Compare => "对比模型".to_string(),
        })
}

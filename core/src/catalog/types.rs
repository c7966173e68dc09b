use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::ScoreStats;

/// 已完成（已评分）文件目录中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedFile {
    pub id: String,
    /// Display name; unique within the catalog.
    pub name: String,
    pub original_name: String,
    pub file_path: String,
    #[serde(default)]
    pub submitter: String,
    pub upload_time: DateTime<Utc>,
    #[serde(default)]
    pub task_id: Option<String>,
    /// "base", "compare" or "unknown".
    #[serde(rename = "type", default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub score_stats: Option<ScoreStats>,
}

fn default_role() -> String {
    "unknown".to_string()
}

//! 任务状态类型定义

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sheet::ScoredRow;
use crate::stats::StatisticsSummary;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// 待评测
    Pending,
    /// 评测中
    Running,
    /// 已完成
    Completed,
    /// 评测失败
    Failed,
    /// 已停止
    Stopped,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// 对比的两侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Base,
    Compare,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Base, Role::Compare];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Compare => "compare",
        }
    }

    /// Accepts role tags and the scorer's positional slot names.
    pub fn from_tag(tag: &str) -> Option<Role> {
        match tag {
            "base" | "file1" => Some(Role::Base),
            "compare" | "file2" => Some(Role::Compare),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文件来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    /// 本次新上传
    Uploaded,
    /// 从已完成文件目录中选择
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub path: String,
    pub name: String,
    pub origin: FileOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}

/// 创建任务时某一侧文件的来源描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileSource {
    Uploaded { path: String, name: String },
    Catalog { id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub submitter: String,
    #[serde(default)]
    pub base: Option<FileSource>,
    #[serde(default)]
    pub compare: Option<FileSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Absent means "do not score this side".
    #[serde(default)]
    pub evaluate: bool,
    /// User-chosen display name; empty means "use the file name".
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfigs {
    #[serde(default)]
    pub base_file: FileConfig,
    #[serde(default)]
    pub compare_file: FileConfig,
}

impl FileConfigs {
    pub fn get(&self, role: Role) -> &FileConfig {
        match role {
            Role::Base => &self.base_file,
            Role::Compare => &self.compare_file,
        }
    }
}

/// 评分进程对单个文件的结果，或由已有数据合成的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ScoredRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_score_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub role: Option<Role>,
    pub output: String,
}

/// 评测任务
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub submitter: String,
    pub created_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub base_file: Option<FileRef>,
    pub compare_file: FileRef,
    pub file_configs: Option<FileConfigs>,
    pub teacher_model: Option<String>,
    pub base_progress: f64,
    pub compare_progress: f64,
    pub results: Vec<FileResult>,
    pub statistics: Vec<StatisticsSummary>,
    pub evaluation_log: String,
    pub start_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
    pub stopped_time: Option<DateTime<Utc>>,
    /// Last failure reason, kept for clients that missed the broadcast.
    pub error: Option<String>,
    pub model_outputs: Vec<ModelOutput>,
    pub model_output_paths: BTreeMap<Role, String>,
}

impl Task {
    pub fn new(
        id: String,
        name: String,
        submitter: String,
        base_file: Option<FileRef>,
        compare_file: FileRef,
    ) -> Self {
        Self {
            id,
            name,
            submitter,
            created_at: Utc::now(),
            status: TaskStatus::Pending,
            base_file,
            compare_file,
            file_configs: None,
            teacher_model: None,
            base_progress: 0.0,
            compare_progress: 0.0,
            results: Vec::new(),
            statistics: Vec::new(),
            evaluation_log: String::new(),
            start_time: None,
            completed_time: None,
            stopped_time: None,
            error: None,
            model_outputs: Vec::new(),
            model_output_paths: BTreeMap::new(),
        }
    }

    pub fn file(&self, role: Role) -> Option<&FileRef> {
        match role {
            Role::Base => self.base_file.as_ref(),
            Role::Compare => Some(&self.compare_file),
        }
    }

    pub fn progress(&self, role: Role) -> f64 {
        match role {
            Role::Base => self.base_progress,
            Role::Compare => self.compare_progress,
        }
    }

    pub fn set_progress(&mut self, role: Role, value: f64) {
        match role {
            Role::Base => self.base_progress = value,
            Role::Compare => self.compare_progress = value,
        }
    }

    /// Configured display name, else the file name.
    pub fn display_name(&self, role: Role) -> Option<String> {
        let configured = self
            .file_configs
            .as_ref()
            .map(|c| c.get(role).name.trim())
            .filter(|n| !n.is_empty());
        match configured {
            Some(n) => Some(n.to_string()),
            None => self.file(role).map(|f| f.name.clone()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Running
    }
}

/// `progress(id)` 返回的快照
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub base_progress: f64,
    pub compare_progress: f64,
    pub results: Vec<FileResult>,
}

/// 直接对比的输出
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonOutcome {
    pub results: Vec<FileResult>,
    pub statistics: Vec<StatisticsSummary>,
}

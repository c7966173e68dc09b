use std::path::PathBuf;

use thiserror::Error;

use super::{CatalogError, RunnerError, SheetError};

/// 任务状态机对外返回的错误
///
/// 校验与冲突错误同步返回调用方；子进程与数据错误只能异步发现，走广播通道。
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("file missing: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("no evaluation results available")]
    MissingResults,

    #[error(transparent)]
    Sheet(SheetError),

    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// 错误大类，供 HTTP 层映射状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl TaskError {
    pub fn kind(&self) -> TaskErrorKind {
        match self {
            Self::Validation(_) => TaskErrorKind::Validation,
            Self::NotFound(_) | Self::FileMissing(_) => TaskErrorKind::NotFound,
            Self::Conflict(_) => TaskErrorKind::Conflict,
            Self::MissingResults => TaskErrorKind::Validation,
            Self::Sheet(SheetError::FileMissing(_)) => TaskErrorKind::NotFound,
            Self::Sheet(_) | Self::Runner(_) | Self::Catalog(_) => TaskErrorKind::Internal,
        }
    }
}

impl From<SheetError> for TaskError {
    fn from(e: SheetError) -> Self {
        match e {
            SheetError::FileMissing(path) => Self::FileMissing(path),
            other => Self::Sheet(other),
        }
    }
}

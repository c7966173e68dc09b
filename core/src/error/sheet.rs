use std::path::PathBuf;

use thiserror::Error;

/// 表格读写错误
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("failed to encode workbook: {0}")]
    Encode(String),

    #[error("workbook {} has no worksheet", .0.display())]
    NoSheet(PathBuf),
}

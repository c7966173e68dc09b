use std::path::Path;

use async_trait::async_trait;

use super::{ScoredRow, Workbook};
use crate::error::SheetError;

/// Preferred worksheet name when a file carries several sheets.
pub const SCORED_SHEET_NAME: &str = "评分数据";

/// 表格编解码插件
#[async_trait]
pub trait SheetCodec: Send + Sync {
    fn name(&self) -> &str;

    /// Read rows as ordered field maps. Uses [`SCORED_SHEET_NAME`] when present,
    /// else the first sheet. A missing file is `SheetError::FileMissing`.
    async fn read_rows(&self, path: &Path) -> Result<Vec<ScoredRow>, SheetError>;

    async fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>, SheetError>;
}

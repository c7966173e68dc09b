//! 对比报告：概览工作表 + 按行位置合并的明细工作表

mod builder;
mod detail;
mod overview;

pub use builder::{build_report, ReportSide};
pub use detail::{write_detail_sheet, DETAIL_SHEET_NAME};
pub use overview::{write_overview_sheet, OVERVIEW_SHEET_NAME};

mod row;
mod traits;
mod validate;
mod workbook;

pub use row::{parse_leading_float, ScoredRow};
pub use traits::{SheetCodec, SCORED_SHEET_NAME};
pub use validate::{has_score_column, validate_rows, REQUIRED_FIELDS};
pub use workbook::{Cell, CellStyle, MergeRange, Sheet, StyledCell, Workbook};

//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `evalcmp_core::api` instead of reaching into internal modules.

pub use crate::catalog::{Catalog, CompletedFile};
pub use crate::config::{
    get_evalcmp_data_dir, load_default, load_from_path, AppConfig, EventsConfig, LoggingConfig,
    ScorerConfig, ServerConfig, StorageConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{
    CatalogError, CliError, RunnerError, SheetError, TaskError, TaskErrorKind,
};
pub use crate::events::{EventBroadcaster, ProgressPayload, TaskEvent};
pub use crate::progress::{LogSeverity, ProgressEvent};
pub use crate::report::build_report;
pub use crate::runner::{
    RunOutcome, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal,
};
pub use crate::sheet::{
    has_score_column, validate_rows, Cell, CellStyle, MergeRange, ScoredRow, Sheet, SheetCodec,
    StyledCell, Workbook, REQUIRED_FIELDS, SCORED_SHEET_NAME,
};
pub use crate::state::{
    ComparisonOutcome, FileConfig, FileConfigs, FileOrigin, FileRef, FileResult, FileSource,
    NewTask, ProgressSnapshot, Role, Task, TaskManager, TaskStatus,
};
pub use crate::stats::{score_stats, ScoreStats, StatisticsSummary};

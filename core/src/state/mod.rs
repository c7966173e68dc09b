//! # 任务状态模块
//!
//! 任务仓库、状态转换规则，以及驱动评分进程的任务管理器。
//!
//! 所有状态变更都在管理器内部完成并广播为 [`crate::events::TaskEvent`]。

mod complete;
mod manager;
mod store;
mod transitions;
pub mod types;

pub use manager::TaskManager;
pub use store::{ProcessHandle, TaskStore};
pub use transitions::{StateTransition, TransitionError};
pub use types::{
    ComparisonOutcome, FileConfig, FileConfigs, FileOrigin, FileRef, FileResult, FileSource,
    ModelOutput, NewTask, ProgressSnapshot, Role, Task, TaskStatus,
};

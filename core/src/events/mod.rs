//! 任务状态变化的广播通道（至多一次投递，不重放）
//!
//! 断线重连的观察者应通过 `TaskManager::get_task` 拉取快照恢复。

mod broadcaster;
mod types;

pub use broadcaster::EventBroadcaster;
pub use types::{ProgressPayload, TaskEvent};

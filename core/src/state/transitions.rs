//! 任务状态转换规则和验证

use super::types::TaskStatus;
use thiserror::Error;

/// 状态转换错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("task is running")]
    Running,
    #[error("task is not running (status {state})")]
    NotRunning { state: TaskStatus },
}

impl From<TransitionError> for crate::error::TaskError {
    fn from(e: TransitionError) -> Self {
        crate::error::TaskError::Conflict(e.to_string())
    }
}

/// 状态转换
pub struct StateTransition;

impl StateTransition {
    /// 验证状态转换是否合法
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        use TaskStatus::*;

        let is_valid = match (from, to) {
            // 同一任务同时只能绑定一个评分进程
            (Running, Running) => return Err(TransitionError::Running),

            // 启动 / 重新评测
            (Pending | Completed | Failed | Stopped, Running) => true,

            // 进程上报结束、出错或用户停止
            (Running, Completed | Failed | Stopped) => true,

            // 直接对比：不经过进程，直接完成
            (Pending | Completed | Failed | Stopped, Completed) => true,

            (_, Stopped) | (_, Failed) => {
                return Err(TransitionError::NotRunning { state: from })
            }

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    /// 判断是否为终态（可重新评测）
    pub fn is_terminal(status: TaskStatus) -> bool {
        matches!(
            status,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Stopped
        )
    }

    /// 只有非评测中的任务可以删除
    pub fn can_delete(status: TaskStatus) -> bool {
        status != TaskStatus::Running
    }

    /// 获取状态的可读描述
    pub fn status_description(status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Pending => "待评测",
            TaskStatus::Running => "评测中",
            TaskStatus::Completed => "已完成",
            TaskStatus::Failed => "评测失败",
            TaskStatus::Stopped => "已停止",
        }
    }
}

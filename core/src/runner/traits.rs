use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::types::{RunExit, RunOutcome, RunnerStartArgs, Signal};
use crate::progress::ProgressEvent;

#[async_trait]
pub trait RunnerSession: Send {
    fn pid(&self) -> Option<u32>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<RunOutcome>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}

/// 接收一次运行产生的事件；`run_token` 用于丢弃已解绑进程的迟到事件
#[async_trait]
pub trait RunEventSink: Send + Sync {
    async fn on_event(&self, task_id: &str, run_token: u64, event: ProgressEvent);
    async fn on_exit(&self, task_id: &str, run_token: u64, exit: RunExit);
}

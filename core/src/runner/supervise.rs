//! 单次评分运行的监督循环：泵送输出、解析事件、响应停止请求、上报退出
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};

use crate::error::RunnerError;
use crate::progress::{classify_stderr_line, parse_stdout_line, StdoutLine};
use crate::util::RingBytes;

use super::abort::stop_sequence;
use super::io_pump::{self, LineStream, LineTap};
use super::traits::{RunEventSink, RunnerSession};
use super::types::RunExit;

pub struct SuperviseInput {
    pub session: Box<dyn RunnerSession>,
    pub task_id: String,
    pub run_token: u64,
    pub sink: Arc<dyn RunEventSink>,
    /// Fires on a stop command. Dropping the sender is not a stop.
    pub stop_rx: oneshot::Receiver<()>,
    pub stop_grace: Duration,
    pub line_channel_capacity: usize,
    pub stderr_tail_bytes: usize,
}

pub async fn supervise(input: SuperviseInput) -> Result<(), RunnerError> {
    let SuperviseInput {
        mut session,
        task_id,
        run_token,
        sink,
        mut stop_rx,
        stop_grace,
        line_channel_capacity,
        stderr_tail_bytes,
    } = input;

    let stdout = session
        .stdout()
        .ok_or_else(|| RunnerError::Spawn("no stdout".into()))?;
    let stderr = session
        .stderr()
        .ok_or_else(|| RunnerError::Spawn("no stderr".into()))?;

    let ring_err = Arc::new(RingBytes::new(stderr_tail_bytes));
    let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(line_channel_capacity.max(1));
    let out_task = io_pump::pump_stdout(stdout, None, line_tx.clone());
    let err_task = io_pump::pump_stderr(stderr, Some(ring_err.clone()), line_tx);

    let started_at = Instant::now();

    let (exit_status, stop_requested) = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);

        let mut status = None;
        let mut stop_requested = false;
        let mut stop_open = true;
        let mut lines_open = true;

        loop {
            tokio::select! {
                res = &mut wait_fut => {
                    status = Some(res);
                    break;
                }

                r = &mut stop_rx, if stop_open => {
                    if r.is_ok() {
                        stop_requested = true;
                        break;
                    }
                    stop_open = false;
                }

                tap = line_rx.recv(), if lines_open => {
                    match tap {
                        Some(tap) => dispatch(sink.as_ref(), &task_id, run_token, tap).await,
                        None => lines_open = false,
                    }
                }
            }
        }
        (status, stop_requested)
    };

    if stop_requested {
        tracing::info!(target: "evalcmp.runner", task_id = %task_id, "stopping scorer");
        let outcome = stop_sequence(&mut session, stop_grace, &task_id).await;
        out_task.abort();
        err_task.abort();
        sink.on_exit(&task_id, run_token, RunExit::Stopped { outcome })
            .await;
        return Ok(());
    }

    // The process is gone but its last lines (usually the `complete`
    // record) may still be queued.
    let idle = stop_grace.max(Duration::from_secs(1));
    loop {
        match tokio::time::timeout(idle, line_rx.recv()).await {
            Ok(Some(tap)) => dispatch(sink.as_ref(), &task_id, run_token, tap).await,
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    target: "evalcmp.runner",
                    task_id = %task_id,
                    "scorer pipes still open after exit, giving up on remaining output"
                );
                break;
            }
        }
    }
    out_task.abort();
    err_task.abort();

    let exit = match exit_status {
        Some(Ok(mut outcome)) => {
            if outcome.duration_ms.is_none() {
                outcome.duration_ms = Some(started_at.elapsed().as_millis() as u64);
            }
            tracing::info!(
                target: "evalcmp.runner",
                task_id = %task_id,
                exit_code = outcome.exit_code,
                duration_ms = outcome.duration_ms.unwrap_or_default(),
                "scorer exited"
            );
            RunExit::Exited {
                outcome,
                stderr_tail: ring_err.to_string_lossy(),
            }
        }
        Some(Err(e)) => {
            tracing::error!(target: "evalcmp.runner", task_id = %task_id, error = %e, "waiting for scorer failed");
            RunExit::WaitFailed(e.to_string())
        }
        None => RunExit::WaitFailed("no exit status".to_string()),
    };
    sink.on_exit(&task_id, run_token, exit).await;
    Ok(())
}

async fn dispatch(sink: &dyn RunEventSink, task_id: &str, run_token: u64, tap: LineTap) {
    match tap.stream {
        LineStream::Stdout => match parse_stdout_line(&tap.line) {
            StdoutLine::Event(ev) => sink.on_event(task_id, run_token, ev).await,
            StdoutLine::Diagnostic(text) => {
                tracing::debug!(target: "evalcmp.scorer", task_id = %task_id, line = %text, "non-json stdout");
            }
            StdoutLine::Ignored => {}
        },
        LineStream::Stderr => {
            if let Some(ev) = classify_stderr_line(&tap.line) {
                sink.on_event(task_id, run_token, ev).await;
            }
        }
    }
}

use std::time::Duration;

use super::traits::RunnerSession;
use super::types::{RunOutcome, Signal};

/// Graceful stop: SIGTERM, wait up to `grace`, then SIGKILL and wait up to
/// `grace` again. Returns the outcome if the process was reaped.
pub async fn stop_sequence(
    session: &mut Box<dyn RunnerSession>,
    grace: Duration,
    task_id: &str,
) -> Option<RunOutcome> {
    if let Err(e) = session.signal(Signal::Term).await {
        tracing::warn!(target: "evalcmp.runner", task_id = %task_id, error = %e, "SIGTERM failed");
    }
    if let Ok(Ok(outcome)) = tokio::time::timeout(grace, session.wait()).await {
        return Some(outcome);
    }

    tracing::warn!(
        target: "evalcmp.runner",
        task_id = %task_id,
        grace_ms = grace.as_millis() as u64,
        "scorer ignored SIGTERM, sending SIGKILL"
    );
    if let Err(e) = session.signal(Signal::Kill).await {
        tracing::error!(target: "evalcmp.runner", task_id = %task_id, error = %e, "SIGKILL failed");
    }
    match tokio::time::timeout(grace, session.wait()).await {
        Ok(Ok(outcome)) => Some(outcome),
        _ => None,
    }
}

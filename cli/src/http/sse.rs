//! GET /api/events - 以 Server-Sent Events 转发任务广播
//!
//! 每个连接订阅一个独立的接收端；落后过多时跳过丢失的事件继续推送，
//! 客户端可通过 `GET /api/tasks/:id` 重新拉取快照。

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use evalcmp_core::api::TaskEvent;
use futures::Stream;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::state::AppState;

pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.record_request("/api/events");
    let mut rx = state.manager.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(ev) => match to_sse_event(&ev) {
                    Some(event) => yield Ok(event),
                    None => continue,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "evalcmp.http", skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    debug!(target: "evalcmp.http", "event channel closed");
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse_event(ev: &TaskEvent) -> Option<Event> {
    match Event::default().event(ev.event_name()).json_data(ev) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(target: "evalcmp.http", event = ev.event_name(), error = %e, "failed to encode event");
            None
        }
    }
}

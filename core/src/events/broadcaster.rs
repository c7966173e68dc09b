use tokio::sync::broadcast;

use super::TaskEvent;

/// 事件广播器
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<TaskEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// 订阅事件；落后太多的订阅者会收到 `Lagged` 并丢失中间事件
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Fan out to current subscribers. Returns how many received it.
    pub fn broadcast(&self, event: TaskEvent) -> usize {
        tracing::trace!(
            target: "evalcmp.events",
            event = event.event_name(),
            task_id = %event.task_id(),
            "broadcast"
        );
        self.tx.send(event).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

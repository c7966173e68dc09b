//! HTTP服务器状态管理

use evalcmp_core::api::{AppConfig, TaskManager};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub manager: TaskManager,
    pub config: Arc<AppConfig>,
    stats: Arc<Mutex<ServerStats>>,
}

impl AppState {
    pub fn new(manager: TaskManager, config: AppConfig) -> Self {
        Self {
            manager,
            config: Arc::new(config),
            stats: Arc::new(Mutex::new(ServerStats::default())),
        }
    }

    /// Counters stay usable after a handler panicked while holding the lock.
    pub fn stats(&self) -> MutexGuard<'_, ServerStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_request(&self, route: &'static str) {
        self.stats().hit(route);
    }

    pub fn record_error(&self) {
        self.stats().errors_total += 1;
    }
}

/// 请求计数，按路由模板聚合
#[derive(Debug)]
pub struct ServerStats {
    pub requests_total: u64,
    pub errors_total: u64,
    pub by_route: BTreeMap<&'static str, u64>,
    started: Instant,
}

impl Default for ServerStats {
    fn default() -> Self {
        Self {
            requests_total: 0,
            errors_total: 0,
            by_route: BTreeMap::new(),
            started: Instant::now(),
        }
    }
}

impl ServerStats {
    fn hit(&mut self, route: &'static str) {
        self.requests_total += 1;
        *self.by_route.entry(route).or_default() += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_route_template() {
        let mut stats = ServerStats::default();
        stats.hit("/api/tasks/:id");
        stats.hit("/api/tasks/:id");
        stats.hit("/health");

        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.by_route["/api/tasks/:id"], 2);
        assert_eq!(stats.by_route["/health"], 1);
        assert!(stats.uptime_seconds() < 1.0);
    }
}

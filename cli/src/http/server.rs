//! HTTP服务器生命周期管理

use super::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::middleware;
use evalcmp_core::api::{AppConfig, AppContext, CliError, TaskEvent, TaskManager};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// CLI 参数优先，配置文件作为默认值
pub fn merge_serve_args(cfg: &AppConfig, args: &ServeArgs) -> AppConfig {
    let mut cfg = cfg.clone();
    if let Some(host) = args.host.as_ref().filter(|h| !h.trim().is_empty()) {
        cfg.server.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(dir) = args.static_dir.as_ref().filter(|d| !d.trim().is_empty()) {
        cfg.server.static_dir = dir.clone();
    }
    cfg
}

/// 处理 serve 命令
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<(), CliError> {
    let config = merge_serve_args(ctx.cfg(), &args);

    let manager = ctx.build_task_manager().await?;
    spawn_event_logger(&manager);

    let state = AppState::new(manager, config);

    start_server(state)
        .await
        .map_err(|e: Box<dyn std::error::Error + Send + Sync>| CliError::Command(e.to_string()))
}

/// 把广播事件镜像到日志，便于无前端时排查
fn spawn_event_logger(manager: &TaskManager) {
    let mut rx = manager.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => log_event(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(target: "evalcmp.events", skipped, "event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(ev: &TaskEvent) {
    match ev {
        TaskEvent::EvaluationProgress(_) | TaskEvent::EvaluationLog { .. } => {
            debug!(target: "evalcmp.events", event = ev.event_name(), task_id = %ev.task_id());
        }
        TaskEvent::EvaluationError { message, .. } => {
            warn!(target: "evalcmp.events", task_id = %ev.task_id(), %message, "evaluation error");
        }
        _ => {
            info!(target: "evalcmp.events", event = ev.event_name(), task_id = %ev.task_id());
        }
    }
}

/// 启动HTTP服务器
pub async fn start_server(state: AppState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = &state.config.server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    let timeout = Duration::from_secs(server.request_timeout_secs.max(1));

    let router = create_router(state.clone());

    let app = router
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack(timeout));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            info!("Starting graceful shutdown...");
        })
        .await?;

    let running = state.manager.running_count().await;
    if running > 0 {
        warn!(running, "server stopped with evaluations still running");
    }
    info!("Server shutdown complete");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to setup SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}

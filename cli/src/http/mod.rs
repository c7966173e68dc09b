//! HTTP服务器模块 - 暴露任务管理 API、实时事件流与静态页面

pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod sse;
pub mod state;
pub mod upload;

pub use models::*;
pub use server::*;
pub use state::*;

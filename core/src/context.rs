use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::error::RunnerError;
use crate::runner::RunnerPlugin;
use crate::sheet::SheetCodec;
use crate::state::TaskManager;
use std::sync::Arc;

/// 任务管理器依赖的外部协作者
#[derive(Clone)]
pub struct Services {
    pub runner: Arc<dyn RunnerPlugin>,
    pub codec: Arc<dyn SheetCodec>,
    pub catalog: Arc<dyn Catalog>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunnerError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub async fn build_services(&self) -> Result<Services, RunnerError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(RunnerError::Config(
                "services_factory missing (cannot build plugins/services)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }

    pub async fn build_task_manager(&self) -> Result<TaskManager, RunnerError> {
        let services = self.build_services().await?;
        Ok(TaskManager::new(&self.cfg, services))
    }
}

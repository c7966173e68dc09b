//! ServicesFactory 实现：从配置构建 runner/codec/catalog，供 CLI 复用。
use async_trait::async_trait;
use evalcmp_core::api::{AppConfig, RunnerError, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunnerError> {
        for dir in [
            &cfg.storage.upload_dir,
            &cfg.storage.completed_dir,
            &cfg.storage.model_output_dir,
        ] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| RunnerError::Config(format!("cannot create {dir}: {e}")))?;
        }
        Ok(Services {
            runner: factory::build_runner(cfg),
            codec: factory::build_codec(cfg),
            catalog: factory::build_catalog(cfg),
        })
    }
}

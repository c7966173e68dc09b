use std::sync::Arc;

use evalcmp_core::catalog::Catalog;
use evalcmp_core::config::AppConfig;
use evalcmp_core::runner::RunnerPlugin;
use evalcmp_core::sheet::SheetCodec;

use crate::catalog::JsonFileCatalog;
use crate::runner::ProcessRunnerPlugin;
use crate::sheet::XlsxSheetCodec;

pub fn build_runner(_cfg: &AppConfig) -> Arc<dyn RunnerPlugin> {
    Arc::new(ProcessRunnerPlugin::new())
}

pub fn build_codec(_cfg: &AppConfig) -> Arc<dyn SheetCodec> {
    Arc::new(XlsxSheetCodec::new())
}

pub fn build_catalog(cfg: &AppConfig) -> Arc<dyn Catalog> {
    Arc::new(JsonFileCatalog::new(&cfg.storage.catalog_path))
}

mod load;
mod types;

pub use load::{get_evalcmp_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, EventsConfig, LoggingConfig, ScorerConfig, ServerConfig, StorageConfig,
};

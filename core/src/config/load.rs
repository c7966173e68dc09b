use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default evalcmp data directory: ~/.evalcmp
pub fn get_evalcmp_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".evalcmp"))
}

/// Load an explicit config file, then apply environment overrides.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let mut cfg = toml::from_str::<AppConfig>(&s)?;
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.evalcmp/config.toml (highest)
    let data_dir = get_evalcmp_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if home_config.exists() {
        let s = std::fs::read_to_string(&home_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else if local_config.exists() {
        let s = std::fs::read_to_string(local_config)?;
        toml::from_str::<AppConfig>(&s)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_ref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

// Environment variable overrides (Priority 0: highest, below CLI flags)
fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = non_empty_env("EVALCMP_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = non_empty_env("EVALCMP_PORT") {
        match v.parse::<u16>() {
            Ok(port) => cfg.server.port = port,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid EVALCMP_PORT"),
        }
    }
    if let Some(v) = non_empty_env("EVALCMP_SCORER_PROGRAM") {
        cfg.scorer.program = v;
    }
    if let Some(v) = non_empty_env("EVALCMP_SCORER_SCRIPT") {
        cfg.scorer.script = v;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

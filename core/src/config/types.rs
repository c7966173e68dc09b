use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scorer: ScorerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "evalcmp=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 静态页面目录，不存在时跳过挂载
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 外部评分进程的启动参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    #[serde(default = "default_scorer_program")]
    pub program: String,

    /// Script passed as the first argument, before the teacher model.
    #[serde(default = "default_scorer_script")]
    pub script: String,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default = "default_teacher_model")]
    pub default_teacher_model: String,

    /// SIGTERM 之后等待多久再 SIGKILL
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,

    #[serde(default = "default_line_channel_capacity")]
    pub line_channel_capacity: usize,

    #[serde(default = "default_stderr_tail_bytes")]
    pub stderr_tail_bytes: usize,

    #[serde(default = "default_scorer_env")]
    pub env: HashMap<String, String>,
}

fn default_scorer_program() -> String {
    "python".to_string()
}

fn default_scorer_script() -> String {
    "eval_service.py".to_string()
}

fn default_teacher_model() -> String {
    "Deepseek".to_string()
}

fn default_stop_grace_ms() -> u64 {
    5_000
}

fn default_line_channel_capacity() -> usize {
    1024
}

fn default_stderr_tail_bytes() -> usize {
    64 * 1024
}

fn default_scorer_env() -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert("PYTHONIOENCODING".to_string(), "utf-8".to_string());
    env
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            program: default_scorer_program(),
            script: default_scorer_script(),
            working_dir: None,
            default_teacher_model: default_teacher_model(),
            stop_grace_ms: default_stop_grace_ms(),
            line_channel_capacity: default_line_channel_capacity(),
            stderr_tail_bytes: default_stderr_tail_bytes(),
            env: default_scorer_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_completed_dir")]
    pub completed_dir: String,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default = "default_model_output_dir")]
    pub model_output_dir: String,
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_completed_dir() -> String {
    "./completed".to_string()
}

fn default_catalog_path() -> String {
    "./completed/completed_files.json".to_string()
}

fn default_model_output_dir() -> String {
    "./model_outputs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            completed_dir: default_completed_dir(),
            catalog_path: default_catalog_path(),
            model_output_dir: default_model_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_channel_capacity")]
    pub channel_capacity: usize,

    /// evaluation_log 上限，超出时丢弃最早的内容
    #[serde(default = "default_transcript_max_bytes")]
    pub transcript_max_bytes: usize,
}

fn default_events_channel_capacity() -> usize {
    1000
}

fn default_transcript_max_bytes() -> usize {
    256 * 1024
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_events_channel_capacity(),
            transcript_max_bytes: default_transcript_max_bytes(),
        }
    }
}

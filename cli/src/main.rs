use clap::Parser;
use evalcmp_cli::commands::cli;
use evalcmp_cli::http;
use evalcmp_core::api::{AppContext, CliError, LoggingConfig, RunnerError};
use evalcmp_plugins::services::PluginServicesFactory;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let code = real_main().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "evalcmp exited with error");
        eprintln!("{e}");
        exit_code_for_error(&e)
    });
    std::process::exit(code);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => evalcmp_core::config::load_from_path(path),
        None => evalcmp_core::config::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));

    let cmd = args
        .command
        .unwrap_or_else(|| cli::Commands::Serve(cli::ServeArgs::default()));
    dispatch(cmd, ctx).await
}

/// 11 配置错误，20 启动或 IO 错误，50 其他
fn exit_code_for_error(e: &CliError) -> i32 {
    match e {
        CliError::Config(_) | CliError::Runner(RunnerError::Config(_)) => 11,
        CliError::Runner(RunnerError::Spawn(_) | RunnerError::StreamIo { .. })
        | CliError::Io(_)
        | CliError::Command(_) => 20,
        CliError::Runner(RunnerError::Plugin(_)) | CliError::Catalog(_) | CliError::Anyhow(_) => {
            50
        }
    }
}

async fn dispatch(cmd: cli::Commands, ctx: AppContext) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => {
            http::handle_serve(serve_args, &ctx).await?;
            Ok(0)
        }
    }
}

/// 控制台层与文件层按配置组合；`RUST_LOG` 优先于 `logging.level`
fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }
    if !logging.console && !logging.file {
        return Err("logging enabled but both console and file output are off".to_string());
    }

    let filter = std::env::var("RUST_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|_| EnvFilter::from_default_env())
        .map_or_else(|| EnvFilter::try_new(&logging.level), Ok)
        .map_err(|e| format!("invalid log filter: {e}"))?;

    let file_layer = if logging.file {
        let dir = log_dir(logging);
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("create log dir {} failed: {e}", dir.display()))?;
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "evalcmp.log"));
        let _ = LOG_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
    } else {
        None
    };

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

fn log_dir(logging: &LoggingConfig) -> std::path::PathBuf {
    logging
        .directory
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("evalcmp"))
}

//! Guardrail - content-safety checks for LLM prompts and responses.
//!
//! Loads `policy.yaml` and `model_config.yaml` from the config directory and
//! serves the inspection API.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use directories::ProjectDirs;
use guardrail_core::GuardrailConfig;
use guardrail_server::{AppState, Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guardrail - content-safety inspection service for LLM traffic
#[derive(Parser, Debug)]
#[command(name = "guardrail", version, about)]
struct Args {
    /// Directory containing policy.yaml and model_config.yaml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Retry a failed model call once before failing open
    #[arg(long)]
    retry_model: bool,
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "guardrail", "Guardrail").map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("guardrail={},warn", log_level)));

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("guardrail")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stdout))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(&args);

    tracing::info!("Starting Guardrail...");
    tracing::debug!("Args: {:?}", args);

    let config = GuardrailConfig::from_dir(&args.config_dir).with_retry(args.retry_model);
    let state = AppState::from_config(&config);

    let server_config = ServerConfig::default()
        .with_host(args.host.clone())
        .with_port(args.port);
    let server = Server::new(server_config, state).context("invalid server address")?;

    server.run().await.context("API server failed")?;

    tracing::info!("Guardrail shutting down");
    Ok(())
}

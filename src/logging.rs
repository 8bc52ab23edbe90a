//! Logging configuration for personarag

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::Result;

const LOG_FILE_PREFIX: &str = "personarag.log";

/// Initialize logging with configuration
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
pub fn init_logging_with_config(config: &crate::config::LoggingConfig) -> Result<()> {
    init(&config.level, &config.directory)
}

fn init(level: &str, directory: &str) -> Result<()> {
    // Create logs directory if it doesn't exist
    let logs_dir = Path::new(directory);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    // Set up file appender for all logs
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::RagChatError::Config(format!("logging already initialized: {e}")))?;

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::info!("Log files will be saved to: {directory}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The guard flushes the file writer on drop; keep it for the life of the process
    std::mem::forget(guard);

    Ok(())
}

/// Initialize console-only logging, used when the log directory is unusable
pub fn init_console_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| crate::RagChatError::Config(format!("logging already initialized: {e}")))?;

    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},personarag={level}")))
}

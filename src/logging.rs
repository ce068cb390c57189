use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for stderr output; `None` silences it
    pub console_level: Option<Level>,
    /// Log level for file output
    pub file_level: Level,
    /// Directory where rolling log files are written; `None` disables file logging
    pub log_dir: Option<PathBuf>,
    /// Whether to enable JSON formatted logs for structured output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Some(Level::INFO),
            file_level: Level::DEBUG,
            log_dir: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("GITLAB_EXPORTER_LOG_LEVEL") {
            config.apply_level(&level);
        }

        if let Ok(log_dir) = std::env::var("GITLAB_EXPORTER_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(log_dir));
        }

        if std::env::var("GITLAB_EXPORTER_JSON_LOGS").is_ok() {
            config.json_format = true;
        }

        config
    }

    /// Applies a level name such as `debug`; `off` disables all output.
    pub fn apply_level(&mut self, level: &str) {
        if level.eq_ignore_ascii_case("off") {
            self.console_level = None;
            self.log_dir = None;
        } else if let Ok(parsed_level) = level.parse::<Level>() {
            self.console_level = Some(parsed_level);
            self.file_level = parsed_level;
        }
    }
}

/// Initialize the logging system with the given configuration
///
/// The returned guard must be held for as long as file logs should be flushed.
pub fn init_logging(
    config: LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "gitlab-exporter.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let filter = EnvFilter::builder()
            .with_default_directive(config.file_level.into())
            .from_env_lossy();

        let file_layer = if config.json_format {
            fmt::layer().json().with_writer(non_blocking).with_filter(filter).boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter)
                .boxed()
        };

        layers.push(file_layer);
    }

    if let Some(console_level) = config.console_level {
        let filter = EnvFilter::builder()
            .with_default_directive(console_level.into())
            .from_env_lossy();

        let console_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .with_filter(filter)
                .boxed()
        };

        layers.push(console_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}

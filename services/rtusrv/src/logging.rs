//! Logging setup
//!
//! Console output by default; daily rolling files when a log directory is
//! configured. `RUST_LOG` takes precedence over the configured level.

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "rtusrv.log";

/// Install the global subscriber
///
/// The returned guard flushes buffered file output and must be kept alive
/// until shutdown.
pub fn init(config: &LoggingSection) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

            tracing::info!("Logger initialized (file mode): {}", dir.display());
            Ok(Some(guard))
        },
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .map_err(|e| anyhow!("Failed to install logger: {}", e))?;

            tracing::info!("Logger initialized (console mode)");
            Ok(None)
        },
    }
}

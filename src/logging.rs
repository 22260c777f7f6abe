use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Result, WebhookError};

const DEFAULT_LOG_FILTER: &str = "info";

/// Appends log lines to a single file, never rotated.
pub struct FileLogger {
    log_directory: PathBuf,
    file_name: String,
}

impl FileLogger {
    pub fn new(logfile: &Path) -> Result<Self> {
        let file_name = logfile
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                WebhookError::LoggingError(format!(
                    "Logfile '{}' has no file name",
                    logfile.display()
                ))
            })?;
        let log_directory = match logfile.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Self {
            log_directory,
            file_name,
        })
    }

    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&self.file_name)
            .build(&self.log_directory)
            .map_err(|e| {
                WebhookError::LoggingError(format!(
                    "Failed to open log file '{}': {}",
                    self.log_directory.join(&self.file_name).display(),
                    e
                ))
            })?;

        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// Console output always, plus the log file when one is configured.
/// The returned guard must be held until exit so buffered lines are flushed.
pub fn setup_logging(logfile: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match logfile {
        Some(path) => {
            let (writer, guard) = FileLogger::new(path)?.setup_file_logging()?;
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer()) // Console output
        .with(file_layer)
        .try_init()
        .map_err(|e| WebhookError::LoggingError(e.to_string()))?;

    Ok(guard)
}

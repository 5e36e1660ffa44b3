//! Logging configuration using the tracing ecosystem.
//!
//! This module configures structured logging with:
//! - File-based output (stdout is reserved for command results)
//! - Daily log rotation
//! - Environment-based log level configuration
//! - Span-based context for async operations

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "marketo_client=info,mkto=info,warn";

/// Log filter used with `--verbose` when RUST_LOG is not set.
const VERBOSE_LOG_FILTER: &str = "marketo_client=debug,mkto=debug,info";

/// Initialize the logging system.
///
/// Sets up tracing with:
/// - Daily rotating file appender in the user's local data directory
/// - Log level configuration via `RUST_LOG` environment variable
/// - Structured output with file/line numbers and thread IDs
///
/// # Log Directory
///
/// - Linux: `~/.local/share/marketo-client/logs/`
/// - macOS: `~/Library/Application Support/marketo-client/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\marketo-client\logs\`
///
/// # Errors
///
/// Returns an error if:
/// - The log directory cannot be determined or created
/// - The tracing subscriber cannot be set
///
/// # Example
///
/// ```no_run
/// use marketo_client::logging;
///
/// logging::init(false).expect("Failed to initialize logging");
/// ```
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "marketo-client.log");

    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mkto starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// Get the log directory path.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("marketo-client").join("logs"))
}

/// Get the path where logs are stored.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

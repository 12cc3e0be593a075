//! Diagnostic logging.
//!
//! The terminal belongs to the session UI, so `tracing` output goes to a
//! file next to the settings. Operator-facing messages go through the
//! controller's activity log instead.

use std::env;
use std::fs;
use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the default filter.
const LOG_ENV: &str = "SCANTUI_LOG";

/// Install the global subscriber writing to `log_path`.
///
/// Keep the returned guard alive for the life of the program; dropping it
/// flushes buffered lines.
pub fn init(log_path: &Path, filter: Option<&str>) -> Result<WorkerGuard, String> {
    let dir = log_path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| format!("invalid log path {}", log_path.display()))?;

    let directive = filter
        .map(str::to_string)
        .or_else(|| env::var(LOG_ENV).ok())
        .unwrap_or_else(|| "info".to_string());
    let filter_layer = EnvFilter::try_new(&directive)
        .map_err(|e| format!("invalid log filter {directive:?}: {e}"))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter_layer)
        .try_init()
        .map_err(|e| format!("failed to install logger: {e}"))?;

    info!(path = %log_path.display(), "logging started");
    Ok(guard)
}

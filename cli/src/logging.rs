//! Logging configuration with file-based output and size-based rotation.
//!
//! Writes logs to `~/.config/rampart/rampart.log` (or platform equivalent)
//! with 10 MB size-based rotation. The interactive prompt owns stdout, so
//! log output goes to the file only. Set `DEBUG_LOGGING=1` to enable debug
//! output for rampart crates.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize file logging.
///
/// Returns a `WorkerGuard` that MUST be held for the application lifetime
/// to ensure all buffered logs are flushed on shutdown. Returns `None` and
/// leaves logging off when the log directory cannot be set up.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    // ~/.config/rampart on Linux, %APPDATA%/rampart on Windows
    let log_dir = dirs::config_dir()?.join("rampart");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // Can't use tracing yet since subscriber not initialized
        eprintln!("Failed to create log directory {log_dir:?}: {e}, logging disabled");
        return None;
    }

    // Size-based rolling file appender (10 MB, keep 1 rotated file)
    let log_path = log_dir.join("rampart.log");
    let file_appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(10 * 1024 * 1024),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to create log file at {log_path:?}: {e}, logging disabled");
            return None;
        }
    };

    // Wrap in non-blocking writer for async-safe logging
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        "info,rampart_core=debug,rampart_cli=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(EnvFilter::new(filter_directive))
        .init();

    tracing::info!(log_file = ?log_path, debug_logging, "rampart logging initialized");

    Some(guard)
}

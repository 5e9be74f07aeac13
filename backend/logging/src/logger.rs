//! Structured Logger
//!
//! Wraps `tracing` to provide JSON or human-readable console output, optional
//! daily-rotated NDJSON files, and environment-based level control.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How the global subscriber should be set up.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines on the console instead of pretty text.
    pub json: bool,
    /// Also write NDJSON to `<dir>/inkcalc.log.YYYY-MM-DD`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            log_dir: None,
        }
    }
}

/// Initialize the global structured logger. Later calls are no-ops.
pub fn init_logger(options: &LogOptions) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let console_layer = if options.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = options.log_dir.as_ref().map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "inkcalc.log");
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

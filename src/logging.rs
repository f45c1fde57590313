use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging
///
/// Console output goes to stderr. `RUST_LOG` wins over `debug`. With a
/// `log_dir` a daily rolling log file is written as well; keep the guard
/// alive until exit so it gets flushed.
pub fn init_logging(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match log_dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);

            let file_appender = tracing_appender::rolling::daily(dir, "yt-format-select.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file = fmt::layer().with_writer(non_blocking).with_ansi(false);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init();

            tracing::info!("logging to {}", dir.display());
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init();
            None
        }
    }
}

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

const LOG_FILE: &str = "retroamp.log";

/// Route `tracing` output to a daily rolling file; the terminal belongs to
/// the TUI. `RUST_LOG` overrides the configured filter. The returned guard
/// flushes pending lines when dropped, so keep it alive until exit.
pub fn init(settings: &LoggingSettings, dir: Option<&Path>) -> Option<WorkerGuard> {
    let dir = dir?;
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("retroamp: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok()?;
    Some(guard)
}

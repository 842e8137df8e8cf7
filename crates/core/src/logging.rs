//! Tracing setup for chainscope binaries.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Overrides the log directory when no explicit one is given.
pub const LOG_DIR_ENV: &str = "CHAINSCOPE_LOG_DIR";

/// `explicit`, else `$CHAINSCOPE_LOG_DIR`, else `~/.chainscope/logs`.
pub fn log_dir(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            std::env::var_os(LOG_DIR_ENV)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(default_log_dir)
}

fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chainscope")
        .join("logs")
}

pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    init_logging_in(&log_dir(None), component, to_stderr)
}

/// Daily-rolling `<dir>/<component>.log.<date>` plus an optional stderr layer.
///
/// A second call in the same process keeps the first subscriber.
pub fn init_logging_in(dir: &Path, component: &str, to_stderr: bool) -> WorkerGuard {
    let dir_error = std::fs::create_dir_all(dir).err();

    let file_appender = tracing_appender::rolling::daily(dir, component);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed && let Some(error) = dir_error {
        tracing::warn!(dir = %dir.display(), %error, "log directory unavailable");
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        assert_eq!(log_dir(Some(Path::new("/tmp/chainscope-logs"))), PathBuf::from("/tmp/chainscope-logs"));
    }

    #[test]
    fn default_dir_lives_under_dot_chainscope() {
        assert!(default_log_dir().ends_with(".chainscope/logs"));
    }

    #[test]
    fn repeated_init_keeps_the_first_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let _first = init_logging_in(dir.path(), "test", false);
        let _second = init_logging_in(dir.path(), "test", false);
        assert!(dir.path().exists());
    }
}

//! Shared observability helpers for the binary and integration tests.
//!
//! The logging initializer centralises our `tracing` setup so that the bot
//! emits into a single rolling file sink, optionally mirrored to stdout.
//! Call [`init_logging`] once near process start and keep the returned
//! [`LogHandle`] alive until shutdown: dropping it flushes the file writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{PromoError, Result};

/// Environment variable consulted when no explicit log directory is configured.
pub const LOG_DIR_ENV: &str = "PROMO_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for the log file name).
    pub app_name: &'static str,
    /// Optional explicit directory for log output. If `None`, we consult
    /// `PROMO_LOG_DIR` and finally fall back to the platform default.
    pub log_dir: Option<PathBuf>,
    /// Whether to duplicate events to stdout in addition to the file sink.
    pub emit_console: bool,
    /// Preferred log encoding.
    pub format: LogFormat,
    /// Default filter applied when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: crate::APP_NAME,
            log_dir: None,
            emit_console: true,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

/// Live logging pipeline.
///
/// Owns the non-blocking writer's guard; buffered events are flushed when
/// the handle is dropped (or [`LogHandle::close`] is called).
#[derive(Debug)]
pub struct LogHandle {
    path: PathBuf,
    _guard: WorkerGuard,
}

impl LogHandle {
    /// Concrete log file for the current (UTC) day.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and release the file sink.
    pub fn close(self) {
        tracing::debug!(path = %self.path.display(), "logging.close");
    }
}

/// Initialise the global `tracing` subscriber and return the handle that
/// keeps the file sink alive.
pub fn init_logging(config: LogConfig) -> Result<LogHandle> {
    let resolved_dir = resolve_log_dir(config.log_dir.as_deref());
    std::fs::create_dir_all(&resolved_dir).map_err(|e| {
        PromoError::Logging(format!(
            "failed to create log directory {}: {e}",
            resolved_dir.display()
        ))
    })?;

    let log_filename = format!("{}.log", config.app_name);
    let full_path = dated_log_path(&resolved_dir, &log_filename, chrono::Utc::now().date_naive());

    let appender = rolling::daily(&resolved_dir, log_filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    let installed = match (config.format, config.emit_console) {
        (LogFormat::Text, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init(),
        (LogFormat::Text, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_writer(std::io::stdout))
            .try_init(),
        (LogFormat::Json, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        (LogFormat::Json, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .try_init(),
    };
    installed.map_err(|e| PromoError::Logging(format!("tracing setup failed: {e}")))?;

    Ok(LogHandle {
        path: full_path,
        _guard: guard,
    })
}

/// The file `rolling::daily` writes to on `day`: `<dir>/<base>.YYYY-MM-DD`.
fn dated_log_path(dir: &Path, base: &str, day: chrono::NaiveDate) -> PathBuf {
    dir.join(format!("{base}.{}", day.format("%Y-%m-%d")))
}

/// Pick the directory logs are written to.
///
/// Precedence: explicit value, then `PROMO_LOG_DIR`, then the platform default.
pub fn resolve_log_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return expand_home(dir);
    }

    if let Ok(env_dir) = std::env::var(LOG_DIR_ENV) {
        if !env_dir.trim().is_empty() {
            return expand_home(Path::new(&env_dir));
        }
    }

    default_log_dir()
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        return home().join(rest);
    }
    path.to_path_buf()
}

/// Platform convention: `~/Library/Logs` on macOS, `/var/log` on Linux when
/// writable (else `~/.local/share/logs`), `~/logs` elsewhere.
fn default_log_dir() -> PathBuf {
    match std::env::consts::OS {
        "macos" => home().join("Library").join("Logs"),
        "linux" => {
            let system = PathBuf::from("/var/log");
            if is_writable_dir(&system) {
                system
            } else {
                home().join(".local").join("share").join("logs")
            }
        }
        _ => home().join("logs"),
    }
}

fn is_writable_dir(dir: &Path) -> bool {
    let probe = dir.join(format!(".{}.probe", crate::APP_NAME));
    let created = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&probe)
        .and_then(|mut f| f.write_all(b""));
    match created {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn explicit_dir_wins_over_env() {
        temp_env::with_var(LOG_DIR_ENV, Some("/tmp/from-env"), || {
            let dir = resolve_log_dir(Some(Path::new("/tmp/explicit")));
            assert_eq!(dir, PathBuf::from("/tmp/explicit"));
        });
    }

    #[test]
    #[serial]
    fn env_dir_used_when_no_explicit_value() {
        temp_env::with_var(LOG_DIR_ENV, Some("/tmp/from-env"), || {
            assert_eq!(resolve_log_dir(None), PathBuf::from("/tmp/from-env"));
        });
    }

    #[test]
    #[serial]
    fn blank_env_dir_falls_back_to_platform_default() {
        temp_env::with_var(LOG_DIR_ENV, Some("  "), || {
            assert_eq!(resolve_log_dir(None), default_log_dir());
        });
    }

    #[test]
    fn tilde_is_expanded_against_home() {
        let expanded = expand_home(Path::new("~/logs/promo"));
        assert_eq!(expanded, home().join("logs/promo"));
        assert_eq!(
            expand_home(Path::new("/var/tmp/x")),
            PathBuf::from("/var/tmp/x")
        );
    }

    #[test]
    fn writable_probe_leaves_no_trace() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(is_writable_dir(tmp.path()));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
        assert!(!is_writable_dir(&tmp.path().join("missing")));
    }

    #[test]
    fn log_file_carries_the_daily_suffix() {
        let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            dated_log_path(Path::new("/var/log"), "bsky-promo-tweeter.log", day),
            PathBuf::from("/var/log/bsky-promo-tweeter.log.2026-03-07")
        );
    }

    #[test]
    fn log_format_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrap {
            format: LogFormat,
        }
        let w: Wrap = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(w.format, LogFormat::Json);
    }
}

//! Logging configuration using tracing
//!
//! Stdout belongs to the backend protocol (command mode echoes backend output
//! there, and the `stdout` verb writes there in GUI mode), so logs always go
//! to a file. GUI runs and command-mode runs log to separate files, so a
//! quick `opsh build` does not bury the log of a long GUI session.

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable that overrides the log filter
pub const LOG_ENV_VAR: &str = "OPSH_LOG";

/// Environment variable that overrides the log directory
pub const LOG_DIR_ENV_VAR: &str = "OPSH_LOG_DIR";

const LOG_SUFFIX: &str = "log";

/// Which kind of run is logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    Gui,
    Command,
}

impl LogMode {
    /// File name prefix; files are named `<prefix>.<date>.log`
    pub fn file_prefix(self) -> &'static str {
        match self {
            LogMode::Gui => "opsh-gui",
            LogMode::Command => "opsh-cli",
        }
    }
}

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/operator-shell/logs/` unless
/// `OPSH_LOG_DIR` names another directory.
/// Log level is controlled by the `OPSH_LOG` environment variable.
///
/// # Examples
/// ```bash
/// OPSH_LOG=debug opsh
/// OPSH_LOG=opsh_app=trace OPSH_LOG_DIR=/tmp/opsh opsh build
/// ```
pub fn init(mode: LogMode) -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(mode.file_prefix())
        .filename_suffix(LOG_SUFFIX)
        .build(&log_dir)
        .map_err(|e| Error::config(format!("Failed to open log file: {}", e)))?;

    // Default to info for our crates, allow override via OPSH_LOG
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| {
        EnvFilter::new("operator_shell=info,opsh_app=info,opsh_backend=info,warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!(
        "Operator Shell starting in {:?} mode (pid {})",
        mode,
        std::process::id()
    );
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV_VAR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("operator-shell").join("logs")
}

/// Get the log file currently written by runs of `mode`
pub fn get_current_log_file(mode: LogMode) -> Result<PathBuf> {
    latest_log_file(&get_log_directory(), mode)
}

/// Most recently modified log file of `mode` in `dir`
fn latest_log_file(dir: &Path, mode: LogMode) -> Result<PathBuf> {
    let prefix = format!("{}.", mode.file_prefix());
    let suffix = format!(".{}", LOG_SUFFIX);

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(&prefix) || !name.ends_with(&suffix) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified >= *time) {
            newest = Some((modified, entry.path()));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| Error::config(format!("No {} log in {}", mode.file_prefix(), dir.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_modes_log_to_separate_files() {
        assert_ne!(LogMode::Gui.file_prefix(), LogMode::Command.file_prefix());
    }

    #[test]
    fn test_latest_log_file_picks_newest_of_mode() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("opsh-cli.2026-01-01.log");
        let new = dir.path().join("opsh-cli.2026-01-02.log");
        let gui = dir.path().join("opsh-gui.2026-01-03.log");
        for path in [&old, &new, &gui] {
            std::fs::write(path, "x").unwrap();
        }
        let past = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(past)
            .unwrap();

        assert_eq!(latest_log_file(dir.path(), LogMode::Command).unwrap(), new);
        assert_eq!(latest_log_file(dir.path(), LogMode::Gui).unwrap(), gui);
    }

    #[test]
    fn test_latest_log_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other.log"), "x").unwrap();

        assert!(latest_log_file(dir.path(), LogMode::Gui).is_err());
    }
}

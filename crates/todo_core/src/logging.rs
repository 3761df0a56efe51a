//! Rolling file logging for the todo core.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once per process.
//! - Record panics as single-line, length-capped log events.
//!
//! # Invariants
//! - Initialization never panics.
//! - A second init with identical settings is a no-op; different settings
//!   are rejected.
//! - Core events are `event=<name> module=<module> status=<status>` lines
//!   carrying ids and counts only; todo titles and descriptions are never
//!   logged.

use crate::config::AppConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "todo_core";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 4;
const PANIC_PAYLOAD_MAX_CHARS: usize = 200;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name, case-insensitive. `warning` is accepted as `warn`.
    pub fn parse(raw: &str) -> Result<Self, LoggingError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::UnsupportedLevel(raw.trim().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `debug` in debug builds, `info` in release builds.
    pub fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyDir,
    RelativeDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(String),
    Conflict {
        active: LogSettings,
        requested: LogSettings,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(raw) => write!(
                f,
                "unsupported log level `{raw}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyDir => write!(f, "log_dir cannot be empty"),
            Self::RelativeDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                dir.display()
            ),
            Self::Backend(reason) => write!(f, "failed to start logger: {reason}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already initialized with {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Validated logger settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub dir: PathBuf,
}

impl LogSettings {
    /// Parses a level name and an absolute log directory.
    pub fn parse(level: &str, log_dir: &str) -> Result<Self, LoggingError> {
        let level = LogLevel::parse(level)?;
        let trimmed = log_dir.trim();
        if trimmed.is_empty() {
            return Err(LoggingError::EmptyDir);
        }
        let dir = Path::new(trimmed);
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDir(dir.to_path_buf()));
        }
        Ok(Self {
            level,
            dir: dir.to_path_buf(),
        })
    }

    /// Uses the level configured through `TODO_APP_LOG_LEVEL`.
    pub fn from_config(config: &AppConfig, log_dir: &str) -> Result<Self, LoggingError> {
        Self::parse(&config.log_level, log_dir)
    }
}

impl Display for LogSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "level `{}` at `{}`", self.level.as_str(), self.dir.display())
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Parses `level` and `log_dir`, then starts logging.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    start(LogSettings::parse(level, log_dir)?)
}

/// Starts logging at the level carried by `config`.
pub fn init_logging_from_config(config: &AppConfig, log_dir: &str) -> Result<(), LoggingError> {
    start(LogSettings::from_config(config, log_dir)?)
}

/// Starts the file logger with `settings`.
///
/// # Errors
/// - `Conflict` when a logger with other settings is already running.
/// - `CreateDir` / `Backend` when the backend cannot start.
pub fn start(settings: LogSettings) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| launch(settings.clone()))?;
    if active.settings != settings {
        return Err(LoggingError::Conflict {
            active: active.settings.clone(),
            requested: settings,
        });
    }
    Ok(())
}

/// Returns the running logger settings, if any.
pub fn active_settings() -> Option<LogSettings> {
    ACTIVE.get().map(|active| active.settings.clone())
}

fn launch(settings: LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDir {
        dir: settings.dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(settings.level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} version={} os={}",
        settings.level.as_str(),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = panic
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=logging status=error location={location} payload={}",
            single_line(&payload, PANIC_PAYLOAD_MAX_CHARS)
        );
        previous(panic);
    }));
}

// Payloads may carry todo text.
fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let mut capped: String = flattened.chars().take(max_chars).collect();
    capped.push_str("...");
    capped
}

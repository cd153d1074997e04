//! Rolling log sink for campaign operations.
//!
//! # Responsibility
//! - Turn the `log_level`/`log_dir` part of [`CoreConfig`] into one
//!   process-wide flexi_logger file sink.
//! - Keep events metadata-only: ids, counts, versions and durations.
//!
//! # Invariants
//! - At most one sink per process; repeating the same settings is a no-op.
//! - Setup failures are returned, never panicked.
//! - Prospect company names never reach the log files.

use crate::config::CoreConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "campaign";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE_SINK: OnceCell<ActiveSink> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Errors raised while starting the log sink.
#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    RelativeDirectory(PathBuf),
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A sink with other settings is already running.
    Reconfigure {
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected off|error|warn|info|debug|trace"
            ),
            Self::RelativeDirectory(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
            Self::CreateDirectory { path, source } => {
                write!(f, "failed to create log directory `{}`: {source}", path.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::Reconfigure { active, requested } => write!(
                f,
                "logging already running with {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::UnsupportedLevel(_) | Self::RelativeDirectory(_) | Self::Reconfigure { .. } => {
                None
            }
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SinkSettings {
    level: LevelFilter,
    dir: PathBuf,
}

impl Display for SinkSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "level={} log_dir={}", self.level, self.dir.display())
    }
}

impl SinkSettings {
    /// `None` when the config leaves logging off.
    fn from_config(config: &CoreConfig) -> Result<Option<Self>, LoggingError> {
        let Some(dir) = config.log_dir.as_ref() else {
            return Ok(None);
        };
        let level = parse_level(&config.log_level)?;
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDirectory(dir.clone()));
        }
        Ok(Some(Self {
            level,
            dir: dir.clone(),
        }))
    }

    fn ensure_matches(&self, requested: &Self) -> Result<(), LoggingError> {
        if self == requested {
            return Ok(());
        }
        Err(LoggingError::Reconfigure {
            active: self.to_string(),
            requested: requested.to_string(),
        })
    }
}

struct ActiveSink {
    settings: SinkSettings,
    _handle: LoggerHandle,
}

/// Starts the file sink described by `config`.
///
/// Returns `Ok(false)` without touching the logger when `config.log_dir` is
/// unset, and `Ok(true)` once a sink with exactly these settings is running.
///
/// # Errors
/// - Unknown level, relative directory, or a directory that cannot be created.
/// - flexi_logger refuses to start.
/// - A sink with a different level or directory already runs in this process.
pub fn init_logging(config: &CoreConfig) -> Result<bool, LoggingError> {
    let Some(requested) = SinkSettings::from_config(config)? else {
        return Ok(false);
    };
    let active = ACTIVE_SINK.get_or_try_init(|| start_sink(requested.clone()))?;
    active.settings.ensure_matches(&requested)?;
    Ok(true)
}

/// Level used when the config does not name one: `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = level.trim();
    if trimmed.eq_ignore_ascii_case("warning") {
        return Ok(LevelFilter::Warn);
    }
    trimmed
        .parse::<LevelFilter>()
        .map_err(|_| LoggingError::UnsupportedLevel(trimmed.to_string()))
}

fn start_sink(settings: SinkSettings) -> Result<ActiveSink, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|source| LoggingError::CreateDirectory {
        path: settings.dir.clone(),
        source,
    })?;

    let spec = LogSpecification::builder().default(settings.level).build();
    let handle = Logger::with(spec)
        .log_to_file(
            FileSpec::default()
                .directory(settings.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    PANIC_HOOK.get_or_init(install_panic_hook);

    info!(
        "event=logging_init module=core status=ok version={} build={} {}",
        env!("CARGO_PKG_VERSION"),
        if cfg!(debug_assertions) { "debug" } else { "release" },
        settings
    );

    Ok(ActiveSink {
        settings,
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            panic_summary(info.payload())
        );
        previous(info);
    }));
}

/// Single-line, length-capped panic text; payloads may carry prospect data.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    single_line(text, PANIC_SUMMARY_CHARS)
}

fn single_line(text: &str, max_chars: usize) -> String {
    let mut line: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().nth(max_chars).is_some() {
        line.push_str("...");
    }
    line
}

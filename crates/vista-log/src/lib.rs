//! Structured logging for Vista.
//!
//! Console output with uptime timestamps, targets and thread names (workers
//! are `vista-worker-N`), plus JSON file logging in debug builds. The level
//! comes from the config's `debug.log_level` unless `RUST_LOG` is set.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vista_config::Config;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE_NAME: &str = "vista.log";

/// Errors that can occur while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file (or its directory) could not be created.
    #[error("failed to create log file {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[source] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Supplies `debug.log_level` and `debug.log_to_file`
///
/// Returns the log file path when file logging is active.
///
/// ```no_run
/// use vista_config::Config;
/// use vista_log::init_logging;
///
/// let config = Config::default();
/// let log_file = init_logging(Some(std::path::Path::new("./logs")), true, Some(&config))?;
/// # Ok::<(), vista_log::LogError>(())
/// ```
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Result<Option<PathBuf>, LogError> {
    let filter_str = config.map_or(DEFAULT_FILTER, |c| configured_filter(&c.debug.log_level));
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let file_logging = debug_build && config.is_none_or(|c| c.debug.log_to_file);
    if file_logging && let Some(log_dir) = log_dir {
        let path = log_dir.join(LOG_FILE_NAME);
        let file = create_log_file(&path)?;
        subscriber
            .with(json_file_layer(file))
            .try_init()
            .map_err(LogError::AlreadyInitialized)?;
        return Ok(Some(path));
    }

    subscriber.try_init().map_err(LogError::AlreadyInitialized)?;
    Ok(None)
}

/// An `EnvFilter` with [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

/// The configured filter string, or [`DEFAULT_FILTER`] when blank.
pub fn configured_filter(level: &str) -> &str {
    match level.trim() {
        "" => DEFAULT_FILTER,
        level => level,
    }
}

/// Create (truncating) the log file and its directory.
pub fn create_log_file(path: &Path) -> Result<File, LogError> {
    let create = || {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        File::create(path)
    };
    create().map_err(|source| LogError::CreateFile {
        path: path.to_path_buf(),
        source,
    })
}

/// JSON lines layer for post-mortem analysis.
pub fn json_file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_blank_level_falls_back() {
        assert_eq!(configured_filter(""), DEFAULT_FILTER);
        assert_eq!(configured_filter("   "), DEFAULT_FILTER);
        assert_eq!(configured_filter(" debug "), "debug");
    }

    #[test]
    fn test_subsystem_filter() {
        let filter = EnvFilter::new("info,vista_stream=debug");
        let filter_str = format!("{filter}");
        assert!(filter_str.contains("vista_stream=debug"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,vista_stream=trace",
            "warn,vista_terrain=debug,vista_mesh=trace",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_new(filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {filter_str}");
        }
    }

    #[test]
    fn test_json_file_layer_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join(LOG_FILE_NAME);
        let file = create_log_file(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(json_file_layer(file));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(chunk = 3, "height job submitted");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().expect("one log line");
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["fields"]["message"], "height job submitted");
        assert_eq!(value["fields"]["chunk"], 3);
    }

    #[test]
    fn test_log_file_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let result = create_log_file(&blocker.join(LOG_FILE_NAME));
        assert!(matches!(result, Err(LogError::CreateFile { .. })));
    }
}

//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging, text or JSON
//! - File logging with daily rotation (JSON, optional)
//! - Level filtering from RUST_LOG

use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use super::config::{LogFormat, MonitoringConfig};

pub const LOG_FILE_PREFIX: &str = "ap-grader.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Returns the file writer guard when file logging is on; it must be kept
/// alive for the duration of the program or buffered lines are lost.
pub fn init_tracing(config: &MonitoringConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    if !config.enabled {
        return Ok(None);
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.enable_console_logging {
        let console = fmt::layer().with_writer(std::io::stderr).with_target(true);
        layers.push(match config.log_format {
            LogFormat::Json => console.json().boxed(),
            LogFormat::Text => console.boxed(),
        });
    }

    let mut guard = None;
    if config.enable_file_logging {
        config.ensure_log_dir()?;
        let file_appender = daily(&config.log_dir, LOG_FILE_PREFIX);
        let (non_blocking_file, file_guard) = non_blocking(file_appender);
        layers.push(
            fmt::layer()
                .with_writer(non_blocking_file)
                .with_ansi(false) // No ANSI codes in files
                .json()
                .boxed(),
        );
        guard = Some(file_guard);
    }

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    Ok(guard)
}

//! Tracing setup: console output plus an optional log file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the filter. `RUST_LOG` wins over `level`; `verbose` forces debug
/// for this crate.
#[must_use]
pub fn env_filter(level: &str, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("clive=debug,info");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Open `path` for appending, creating missing parent directories.
pub fn file_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map_or_else(|| "clive.log".into(), |name| name.to_string_lossy());

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
}

/// Install the global subscriber.
///
/// An unusable log file is reported on stderr and logging continues on the
/// console. The returned guard flushes the file writer and must be held
/// until exit.
pub fn init(level: &str, verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let appender = log_file.and_then(|path| match file_appender(path) {
        Ok(appender) => Some(appender),
        Err(e) => {
            eprintln!("Cannot write log file {}: {e}", path.display());
            None
        }
    });
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(env_filter(level, verbose))
        .init();

    guard
}

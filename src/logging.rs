//! Log output for the library and the command line tool.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::Error;

/// Install the global tracing subscriber.
///
/// Logs are written to stderr, filtered by `RUST_LOG` with a default level of
/// `info`. If `log_file` is given, logs at `debug` and above are also
/// appended to that file.
///
/// This must be called at most once per process.
///
/// # Errors
/// Returns [Error::LogFileError] if the log file cannot be opened.
pub fn setup_logging(log_file: Option<&Path>) -> Result<(), Error> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let debug_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|error| {
                    Error::LogFileError(path.display().to_string(), error.to_string())
                })?;

            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_log)
        .with(debug_log)
        .init();

    Ok(())
}

//! Logging configuration for the gateway.
//!
//! Logs go to stderr by default, or to a file when one is requested.
//! The filter comes from `RUST_LOG` and defaults to `info`.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging, to `log_file` if given and otherwise to stderr.
///
/// Falls back to stderr if the file cannot be created.
pub fn init_logging(log_file: Option<&Path>) {
    match log_file.map(open_log_file) {
        Some(Ok(file)) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(file)
            .with_ansi(false) // No ANSI colors in file output
            .init(),
        Some(Err(e)) => {
            eprintln!("Warning: Could not open log file, logging to stderr: {e}");
            init_stderr_logging();
        }
        None => init_stderr_logging(),
    }
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// Opens `path` for appending, creating parent directories as needed.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

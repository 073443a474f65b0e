//! Diagnostic tracing.
//!
//! # Separation of Concerns
//!
//! - **Tracing (this module)**: dev diagnostics via `RUST_LOG` on stderr, plus
//!   an optional append-only trace file for later inspection.
//! - **Presenter (`io/presenter`)**: everything the user is meant to read.
//!   Unaffected by `RUST_LOG`.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG` for the stderr layer, defaulting to `warn`. When
/// `log_file` is given, a second layer appends everything at `debug` and
/// above to it without ANSI escapes.
///
/// # Example
/// ```bash
/// RUST_LOG=contextvibes=debug contextvibes sync
/// ```
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr = fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(filter);

    let file = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log(path)?))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(file)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_and_appended() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trace.log");
        std::fs::write(&path, "earlier\n").expect("seed");
        drop(open_log(&path).expect("open"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "earlier\n");
    }

    #[test]
    fn unopenable_log_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = open_log(&dir.path().join("missing").join("trace.log")).expect_err("no parent");
        assert!(format!("{err:#}").contains("open log file"));
    }
}

// src/logging.rs

use color_eyre::eyre::{eyre, Result};
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    /// `WEBRADAR_LOGLEVEL`, consulted when `RUST_LOG` is unset.
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", env!("CARGO_CRATE_NAME").to_uppercase());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Where the scan log goes: `override_dir` when given, else the per-user data
/// directory, else `./.data`.
pub fn log_directory(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    ProjectDirs::from("com", "webradar", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".").join(".data"))
}

/// Picks the filter directive. `RUST_LOG` beats the crate-specific variable;
/// with neither set only this crate logs, at `info`.
pub fn filter_directive(rust_log: Option<String>, crate_level: Option<String>) -> String {
    rust_log
        .or_else(|| crate_level.map(|level| format!("{}={}", env!("CARGO_CRATE_NAME"), level)))
        .unwrap_or_else(|| format!("{}=info", env!("CARGO_CRATE_NAME")))
}

/// Installs the file logger plus the span-trace layer used by `color-eyre`.
///
/// The log file is truncated on every run. Returns its path.
pub fn initialize_logging(override_dir: Option<&Path>) -> Result<PathBuf> {
    let directory = log_directory(override_dir);
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(LOG_FILE.as_str());
    let log_file = std::fs::File::create(&log_path)?;

    let directive = filter_directive(std::env::var("RUST_LOG").ok(), std::env::var(LOG_ENV.as_str()).ok());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| eyre!("logging already initialised: {e}"))?;

    Ok(log_path)
}

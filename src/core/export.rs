// src/core/export.rs

use tracing::info;

use crate::core::models::ScanResult;
use color_eyre::eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};

/// File name a result is saved under, e.g. `scan_example_com.json`.
pub fn export_file_name(domain: &str) -> String {
    format!("scan_{}.json", domain.replace('.', "_"))
}

/// Writes `result` as pretty-printed JSON into `directory` and returns the path written.
pub fn save_json(result: &ScanResult, directory: &Path) -> Result<PathBuf> {
    let path = directory.join(export_file_name(&result.domain));
    let data = serde_json::to_string_pretty(result).wrap_err("failed to serialise scan result")?;
    std::fs::write(&path, data).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Scan result saved.");
    Ok(path)
}

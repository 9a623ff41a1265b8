use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use flowdoc_core::model::AnalysisDocument;

/// Read an analysis document (as written by `analyze`) from disk.
pub fn load_document(path: &Path) -> Result<AnalysisDocument> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read analysis document: {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse analysis document: {}", path.display()))
}

/// Pretty-print `value` as JSON into `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

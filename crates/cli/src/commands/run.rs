use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use flowdoc_core::diagram::to_bundle;

use crate::commands::{build_document, write_bundle, write_json, AnalyzeOptions};

/// Contents of `run_metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub path: String,
    pub source: String,
    pub language: String,
    pub sha: Option<String>,
    pub unit_count: usize,
    pub diagram_count: usize,
    pub notes: String,
    pub started_at: String,
    pub finished_at: String,
}

/// Analyze a file and render its diagrams into `out_dir`.
///
/// Layout:
/// - `analysis.json`
/// - `diagrams/diagrams.json` and one `.mmd` per unit
/// - `run_metadata.json`
pub fn run_command(opts: &AnalyzeOptions, out_dir: &str) -> Result<()> {
    let started_at = Utc::now().to_rfc3339();
    let out_root = Path::new(out_dir);
    fs::create_dir_all(out_root)
        .with_context(|| format!("Failed to create output dir: {}", out_root.display()))?;

    let (doc, source) = build_document(opts)?;
    write_json(&out_root.join("analysis.json"), &doc)?;

    let bundle = to_bundle(&doc);
    let written = write_bundle(&bundle, &out_root.join("diagrams"))?;

    let metadata = RunMetadata {
        path: doc.file.path.clone(),
        source,
        language: doc.language.clone(),
        sha: doc.file.sha.clone(),
        unit_count: doc.units.len(),
        diagram_count: written.len(),
        notes: doc.summary.notes.clone(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
    };
    let metadata_path = out_root.join("run_metadata.json");
    write_json(&metadata_path, &metadata)
        .with_context(|| format!("Failed to write run metadata at {}", metadata_path.display()))?;

    println!("Analyzed: {}", metadata.path);
    println!("  Language: {}", metadata.language);
    println!("  Source: {}", metadata.source);
    println!("  Units: {}", metadata.unit_count);
    println!("  Output: {}", out_root.display());
    Ok(())
}

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use flowdoc_core::config::load_config;
use flowdoc_core::model::AnalysisDocument;
use flowdoc_core::services::analysis::{AnalysisRequest, Analyzer, FileFetcher, LocalFileFetcher};
use flowdoc_core::services::sources::default_source_registry;

use crate::canonicalize_or_current;
use crate::commands::{print_json, write_json};

/// Inputs shared by `analyze` and `run`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Directory the file path is resolved against.
    pub root: String,
    /// File path relative to `root`.
    pub path: String,
    pub git_ref: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Unit source name; overrides the configured one.
    pub source: Option<String>,
    /// Optional JSON/YAML analyzer config.
    pub config: Option<String>,
}

impl AnalyzeOptions {
    pub fn new(root: impl Into<String>, path: impl Into<String>) -> Self {
        Self { root: root.into(), path: path.into(), ..Self::default() }
    }
}

/// Analyze one file and return the document together with the source name used.
pub fn build_document(opts: &AnalyzeOptions) -> Result<(AnalysisDocument, String)> {
    let config = load_config(opts.config.as_deref().map(Path::new))?;
    let source_name = opts.source.clone().unwrap_or_else(|| config.source.clone());
    let registry = default_source_registry(&config);
    let source = registry.require(&source_name)?;

    let root = canonicalize_or_current(&opts.root)?;
    debug!(root = %root.display(), path = %opts.path, source = %source_name, "analyzing file");
    let fetcher = LocalFileFetcher::new(&root);
    let file = fetcher
        .fetch(&opts.path, opts.git_ref.as_deref())
        .with_context(|| format!("Failed to fetch {} under {}", opts.path, root.display()))?;
    let request = AnalysisRequest::from_fetched(opts.path.clone(), file)?
        .with_ref(opts.git_ref.clone())
        .with_repo(opts.owner.clone(), opts.repo.clone());

    let doc = Analyzer::new(source).analyze(&request);
    Ok((doc, source_name))
}

/// Analyze a file; print the document or write it to `out`.
pub fn analyze_command(opts: &AnalyzeOptions, out: Option<&str>) -> Result<()> {
    let (doc, _source) = build_document(opts)?;
    match out {
        Some(out) => {
            let out_path = Path::new(out);
            write_json(out_path, &doc)?;
            println!("Analysis written to {} ({} unit(s))", out_path.display(), doc.units.len());
            if !doc.summary.notes.is_empty() {
                println!("Notes: {}", doc.summary.notes);
            }
            Ok(())
        }
        None => print_json(&doc),
    }
}

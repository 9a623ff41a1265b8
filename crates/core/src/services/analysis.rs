use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::detect::detect;
use crate::diagram::classify;
use crate::model::{
    AnalysisDocument, AnalysisSummary, DetectorInfo, DiagramType, FileInfo, Unit,
};
use crate::normalize::Normalizer;
use crate::schema::{validate_document, SchemaValidator, UnitValidator, ANALYSIS_VERSION};
use crate::services::sources::{GenerationRequest, UnitSource};

/// A file as obtained from the caller's storage (local disk, remote repository, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub is_text: bool,
    pub text: Option<String>,
    pub sha: String,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("File not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File is not text: {0}")]
    NotText(String),
}

/// The only IO dependency of the analysis core: fetch one file at a ref.
pub trait FileFetcher: Send + Sync {
    fn fetch(&self, path: &str, git_ref: Option<&str>) -> Result<FetchedFile, FetchError>;
}

/// Fetches files from a local directory. The ref is ignored.
#[derive(Debug, Clone)]
pub struct LocalFileFetcher {
    root: PathBuf,
}

impl LocalFileFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl FileFetcher for LocalFileFetcher {
    fn fetch(&self, path: &str, _git_ref: Option<&str>) -> Result<FetchedFile, FetchError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(FetchError::NotFound(full));
        }
        let bytes =
            std::fs::read(&full).map_err(|source| FetchError::Io { path: full.clone(), source })?;
        let sha = sha256_hex(&bytes);
        let size = bytes.len() as u64;
        let text = String::from_utf8(bytes).ok();
        Ok(FetchedFile { is_text: text.is_some(), text, sha, size })
    }
}

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Everything needed to analyze one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub path: String,
    pub content: String,
    /// Content hash; computed from `content` when absent.
    pub sha: Option<String>,
    /// Byte size; `content.len()` when absent.
    pub size_bytes: Option<u64>,
    pub git_ref: Option<String>,
    pub repo: Option<String>,
    pub owner: Option<String>,
}

impl AnalysisRequest {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into(), ..Self::default() }
    }

    /// Build a request from a fetched file; binary files are rejected.
    pub fn from_fetched(path: impl Into<String>, file: FetchedFile) -> Result<Self, FetchError> {
        let path = path.into();
        let Some(text) = file.text.filter(|_| file.is_text) else {
            return Err(FetchError::NotText(path));
        };
        Ok(Self {
            path,
            content: text,
            sha: Some(file.sha),
            size_bytes: Some(file.size),
            ..Self::default()
        })
    }

    pub fn with_ref(mut self, git_ref: Option<String>) -> Self {
        self.git_ref = git_ref;
        self
    }

    pub fn with_repo(mut self, owner: Option<String>, repo: Option<String>) -> Self {
        self.owner = owner;
        self.repo = repo;
        self
    }

    fn line_count(&self) -> usize {
        if self.content.is_empty() {
            1
        } else {
            self.content.matches('\n').count() + 1
        }
    }
}

/// End-to-end pipeline: detect, generate, normalize, summarize.
///
/// Never fails. Generation errors and rejected records end up as the
/// fallback unit plus a note in the summary.
pub struct Analyzer<'a> {
    source: &'a dyn UnitSource,
    validator: &'a dyn UnitValidator,
}

impl<'a> Analyzer<'a> {
    pub fn new(source: &'a dyn UnitSource) -> Self {
        Self { source, validator: &SchemaValidator }
    }

    pub fn with_validator(mut self, validator: &'a dyn UnitValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisDocument {
        let detection = detect(&request.path, Some(&request.content));
        let kind = self.source.unit_kind(&detection.language);
        let normalizer =
            Normalizer::new(kind, self.validator).with_line_count(request.line_count());
        let mut notes: Vec<String> = Vec::new();

        let generation = GenerationRequest {
            code: &request.content,
            language: &detection.language,
            path: &request.path,
            kind,
        };
        let units = match self.source.generate(&generation) {
            Ok(raw) => {
                let outcome = normalizer.normalize(&raw);
                if outcome.dropped > 0 {
                    notes.push(format!(
                        "{} unit record(s) dropped during normalization",
                        outcome.dropped
                    ));
                }
                if outcome.fallback {
                    notes.push("no valid unit returned; fallback unit substituted".to_string());
                }
                outcome.units
            }
            Err(err) => {
                warn!(source = self.source.name(), error = %err, "unit generation failed");
                notes.push(format!("unit generation failed: {err}"));
                vec![normalizer.fallback_unit(&format!("unit generation failed ({err})"))]
            }
        };

        info!(
            path = %request.path,
            language = %detection.language,
            source = self.source.name(),
            units = units.len(),
            "analysis complete"
        );

        let doc = AnalysisDocument {
            version: ANALYSIS_VERSION.to_string(),
            file: FileInfo {
                path: request.path.clone(),
                sha: Some(
                    request.sha.clone().unwrap_or_else(|| sha256_hex(request.content.as_bytes())),
                ),
                repo: request.repo.clone(),
                owner: request.owner.clone(),
                size_bytes: request.size_bytes.unwrap_or(request.content.len() as u64),
            },
            git_ref: request.git_ref.clone(),
            language: detection.language.clone(),
            detector: DetectorInfo { method: detection.method, confidence: detection.confidence },
            summary: AnalysisSummary {
                unit_count: units.len(),
                diagram_suggestion: dominant_diagram_type(&units),
                notes: notes.join("; "),
            },
            units,
        };

        if let Err(violations) = validate_document(&doc, self.validator) {
            warn!(?violations, "analysis document failed validation");
        }
        doc
    }

    /// Fetch `path` through `fetcher`, then analyze it. Fetch errors belong to the caller.
    pub fn analyze_file(
        &self,
        fetcher: &dyn FileFetcher,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<AnalysisDocument, FetchError> {
        let file = fetcher.fetch(path, git_ref)?;
        let request =
            AnalysisRequest::from_fetched(path, file)?.with_ref(git_ref.map(str::to_string));
        Ok(self.analyze(&request))
    }
}

/// Most frequent classifier result; ties go to the type seen first.
pub fn dominant_diagram_type(units: &[Unit]) -> DiagramType {
    let mut counts: HashMap<DiagramType, usize> = HashMap::new();
    let mut order: Vec<DiagramType> = Vec::new();
    for ty in units.iter().map(classify) {
        let count = counts.entry(ty).or_insert(0);
        if *count == 0 {
            order.push(ty);
        }
        *count += 1;
    }
    let mut best = DiagramType::Flowchart;
    let mut best_count = 0usize;
    for ty in order {
        let count = counts[&ty];
        if count > best_count {
            best = ty;
            best_count = count;
        }
    }
    best
}

//! Unit sources: producers of raw, untrusted unit records.
//!
//! A source is either the deterministic [`MockUnitSource`] or the network-backed
//! [`HttpUnitSource`]. Either way the output is only a candidate list; it must go
//! through the normalizer before anything downstream sees it.

pub mod http;
pub mod mock;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::config::{AnalyzerConfig, ConfigError};
use crate::model::UnitKind;

pub use http::{parse_unit_payload, HttpUnitSource};
pub use mock::MockUnitSource;

/// Input handed to a unit source.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub code: &'a str,
    pub language: &'a str,
    pub path: &'a str,
    /// Unit variant the caller will normalize the records as.
    pub kind: UnitKind,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),
    #[error("Generator request timed out after {0}s")]
    Timeout(u64),
    #[error("Generator transport error: {0}")]
    Transport(String),
    #[error("Generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Generator output is not a unit list: {0}")]
    MalformedOutput(String),
}

/// Capability that turns code into candidate unit records.
pub trait UnitSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unit variant this source produces for `language`.
    fn unit_kind(&self, language: &str) -> UnitKind {
        UnitKind::for_language(language)
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<Value>, GenerationError>;
}

/// Registry of unit sources; callers select by name.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn UnitSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self { sources: HashMap::new() }
    }

    pub fn register<S: UnitSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.insert(source.name().to_string(), Box::new(source));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn UnitSource> {
        self.sources.get(name).map(|s| &**s)
    }

    /// Like [`get`](Self::get), but reports the available names on a miss.
    pub fn require(&self, name: &str) -> Result<&dyn UnitSource, ConfigError> {
        self.get(name).ok_or_else(|| ConfigError::UnknownSource {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Sorted source names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry holding the mock source and an HTTP source built from `config`.
pub fn default_source_registry(config: &AnalyzerConfig) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(MockUnitSource);
    registry.register(HttpUnitSource::new(config.llm.clone()));
    registry
}

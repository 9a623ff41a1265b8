//! Analyzer configuration: which unit source to use and how to reach the
//! external generator.
//!
//! Loaded from a JSON or YAML file (by extension), then overridden from the
//! environment (`ANALYZE_WITH_LLM`, `LLM_MODEL`, `LLM_BASE_URL`). A `.env`
//! file is honored when present.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MOCK_SOURCE: &str = "mock";
pub const HTTP_SOURCE: &str = "http";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported config format for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),
    #[error("Unknown unit source '{name}'. Available: {available}")]
    UnknownSource { name: String, available: String },
}

fn default_source() -> String {
    MOCK_SOURCE.to_string()
}

/// Top-level analyzer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Name of the registered unit source (`mock` or `http`).
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { source: default_source(), llm: LlmConfig::default() }
    }
}

/// Settings for the OpenAI-compatible chat-completions generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Code sent to the generator is cut to this many characters.
    pub max_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.2,
            max_chars: 12_000,
        }
    }
}

impl AnalyzerConfig {
    /// Read a config file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analyzer config at {}", path.display()))?;
        let ext =
            path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        let config = match ext.as_str() {
            "json" => serde_json::from_str(&body).context("Failed to parse analyzer config JSON")?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&body).context("Failed to parse analyzer config YAML")?
            }
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf()).into()),
        };
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (tests pass a map).
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(flag) = lookup("ANALYZE_WITH_LLM") {
            if matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on") {
                self.source = HTTP_SOURCE.to_string();
            }
        }
        if let Some(model) = lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
        if let Some(url) = lookup("LLM_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.llm.base_url = url;
        }
    }
}

/// Load `path` (or defaults), after reading `.env`, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    dotenvy::dotenv().ok();
    let mut config = match path {
        Some(p) => AnalyzerConfig::load(p)?,
        None => AnalyzerConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

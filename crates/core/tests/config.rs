use std::collections::HashMap;

use flowdoc_core::config::{AnalyzerConfig, ConfigError, HTTP_SOURCE, MOCK_SOURCE};
use flowdoc_core::version;
use tempfile::tempdir;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn version_is_non_empty() {
    assert!(!version().is_empty());
}

#[test]
fn defaults() {
    let config = AnalyzerConfig::default();
    assert_eq!(config.source, MOCK_SOURCE);
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.llm.timeout_secs, 60);
    assert_eq!(config.llm.max_chars, 12_000);
}

#[test]
fn env_overrides() {
    let mut config = AnalyzerConfig::default();
    config.apply_env_with(lookup(&[
        ("ANALYZE_WITH_LLM", "Yes"),
        ("LLM_MODEL", "local-model"),
        ("LLM_BASE_URL", "http://localhost:8080/v1"),
    ]));
    assert_eq!(config.source, HTTP_SOURCE);
    assert_eq!(config.llm.model, "local-model");
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
}

#[test]
fn falsy_or_blank_env_values_change_nothing() {
    let mut config = AnalyzerConfig::default();
    config.apply_env_with(lookup(&[("ANALYZE_WITH_LLM", "0"), ("LLM_MODEL", "  ")]));
    assert_eq!(config, AnalyzerConfig::default());
}

#[test]
fn loads_yaml_with_partial_llm_section() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("flowdoc.yaml");
    std::fs::write(&path, "source: http\nllm:\n  model: tiny\n  timeout_secs: 5\n").unwrap();
    let config = AnalyzerConfig::load(&path).unwrap();
    assert_eq!(config.source, "http");
    assert_eq!(config.llm.model, "tiny");
    assert_eq!(config.llm.timeout_secs, 5);
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
}

#[test]
fn loads_json_and_defaults_missing_fields() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("flowdoc.json");
    std::fs::write(&path, r#"{"llm": {"max_chars": 100}}"#).unwrap();
    let config = AnalyzerConfig::load(&path).unwrap();
    assert_eq!(config.source, MOCK_SOURCE);
    assert_eq!(config.llm.max_chars, 100);
}

#[test]
fn rejects_unknown_extension_and_bad_content() {
    let temp = tempdir().unwrap();
    let toml = temp.path().join("flowdoc.toml");
    std::fs::write(&toml, "source = 'mock'").unwrap();
    let err = AnalyzerConfig::load(&toml).unwrap_err();
    assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::UnsupportedFormat(_))));

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, "{not json").unwrap();
    let err = AnalyzerConfig::load(&bad).unwrap_err();
    assert!(err.to_string().contains("Failed to parse analyzer config JSON"));

    assert!(AnalyzerConfig::load(&temp.path().join("absent.yaml")).is_err());
}

use anyhow::Result;
use serde::Serialize;

use flowdoc_core::config::{load_config, HTTP_SOURCE, MOCK_SOURCE};
use flowdoc_core::services::sources::default_source_registry;

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub description: String,
    /// Whether this is the source selected by config/environment.
    pub default: bool,
}

/// List available unit sources known to this binary.
pub fn list_sources_command(json: bool) -> Result<()> {
    let config = load_config(None)?;
    let registry = default_source_registry(&config);
    let entries: Vec<SourceInfo> = registry
        .names()
        .into_iter()
        .map(|name| {
            let description = match name.as_str() {
                MOCK_SOURCE => "Deterministic single-unit output; no network".to_string(),
                HTTP_SOURCE => format!(
                    "OpenAI-compatible chat completions at {} (model {}, key from {})",
                    config.llm.base_url, config.llm.model, config.llm.api_key_env
                ),
                other => format!("Source '{}'", other),
            };
            let default = name == config.source;
            SourceInfo { name, description, default }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Sources: (none)");
        return Ok(());
    }

    println!("Sources:");
    for entry in entries {
        let marker = if entry.default { " (default)" } else { "" };
        println!("- {}{}: {}", entry.name, marker, entry.description);
    }
    Ok(())
}

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::config::LlmConfig;
use crate::model::UnitKind;
use crate::normalize::coerce::truncate_chars;
use crate::schema::schema_summary;
use crate::services::sources::{GenerationError, GenerationRequest, UnitSource};

const SYSTEM_PROMPT: &str = r#"You read source code and return STRUCTURED documentation.
NO FREE TEXT. The output must be strict JSON following unit.generic.schema.json.
Rules:
- Identify UNITS (functions/methods) in the code.
- For each unit produce: kind="generic", id, name, range, signature, purpose, io, logic, risks?, diagram_suggestion?
- Keep step/decision ids short (e.g. s1, s2, d1). Use approximate start_line/end_line in 'range'.
- In 'logic':
  - steps: concise sequence of what the function does
  - decisions: main conditions; true_path/false_path are lists of step ids
  - calls: relevant calls (api/db/queue/other)
- diagram_suggestion, when it makes sense, is one of "flowchart", "sequence", "state", "class", "er", "dfd", "none". Never anything else.
- Keep labels (text) to about 60 characters.
- NEVER add comments outside the JSON."#;

fn user_prompt(request: &GenerationRequest<'_>, snippet: &str) -> String {
    format!(
        "Language: {language}\nFile: {path}\nAnalyzed excerpt (may be truncated):\n{snippet}\n\
         JSON schema (unit.generic.schema.json, summary):\n{summary}\n\n\
         Expected output: a JSON ARRAY of units (e.g. [ {{...}}, {{...}} ]).\n\
         IMPORTANT: only the JSON array. Nothing else.",
        language = request.language,
        path = request.path,
        summary = schema_summary(UnitKind::Generic),
    )
}

/// OpenAI-compatible chat-completions generator.
///
/// The API key is read from the environment variable named in the config on
/// every call, so a registry can be built without credentials present.
pub struct HttpUnitSource {
    config: LlmConfig,
}

impl HttpUnitSource {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<String, GenerationError> {
        std::env::var(&self.config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::MissingCredentials(self.config.api_key_env.clone()))
    }
}

impl UnitSource for HttpUnitSource {
    fn name(&self) -> &'static str {
        "http"
    }

    /// The prompt asks for generic units only.
    fn unit_kind(&self, _language: &str) -> UnitKind {
        UnitKind::Generic
    }

    #[instrument(skip(self, request), fields(path = request.path, language = request.language))]
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<Value>, GenerationError> {
        let api_key = self.api_key()?;
        let snippet = truncate_chars(request.code, self.config.max_chars);
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(request, &snippet)}
            ]
        });

        let timeout = self.config.timeout_secs;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        info!(model = %self.config.model, "requesting units from generator");
        let response = client.post(self.endpoint()).bearer_auth(api_key).json(&body).send().map_err(
            |e| {
                if e.is_timeout() {
                    GenerationError::Timeout(timeout)
                } else {
                    GenerationError::Transport(e.to_string())
                }
            },
        )?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }

        let payload: Value =
            response.json().map_err(|e| GenerationError::MalformedOutput(e.to_string()))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GenerationError::MalformedOutput("missing choices[0].message.content".to_string())
            })?;
        debug!(chars = content.len(), "generator reply received");
        parse_unit_payload(content)
    }
}

/// Parse a generator reply into raw records. Accepts a fenced block, a JSON
/// array, or a single JSON object.
pub fn parse_unit_payload(content: &str) -> Result<Vec<Value>, GenerationError> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedOutput(e.to_string()))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![value]),
        other => Err(GenerationError::MalformedOutput(format!(
            "expected a JSON array or object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use crate::model::UnitKind;
use crate::normalize::normalize_id;
use crate::services::sources::{GenerationError, GenerationRequest, UnitSource};

const MAX_MOCK_LINES: usize = 999_999;
const DEFAULT_PARAGRAPH: &str = "MAIN-PARAGRAPH";

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*([A-Z0-9-]+)\.\s*$").expect("valid paragraph regex"))
}

/// Line span covering the whole file, clamped to a sane maximum.
fn whole_file_range(code: &str) -> (usize, usize) {
    if code.is_empty() {
        return (1, 1);
    }
    let lines = code.matches('\n').count() + 1;
    (1, lines.clamp(1, MAX_MOCK_LINES))
}

/// Deterministic source that emits one minimal, schema-valid unit per file.
///
/// Useful when no generator is configured and as the reference shape for tests.
pub struct MockUnitSource;

impl MockUnitSource {
    fn generic_unit(code: &str) -> Value {
        let (start, end) = whole_file_range(code);
        json!({
            "kind": "generic",
            "id": "u_main",
            "name": "main",
            "range": {"start_line": start, "end_line": end},
            "signature": {"parameters": [], "returns": null},
            "purpose": "Main function (mock): summarizes the purpose of the code.",
            "io": {"inputs": [], "outputs": [], "side_effects": []},
            "logic": {
                "steps": [
                    {"id": "s1", "text": "Initialize", "kind": "action"},
                    {"id": "s2", "text": "Main processing", "kind": "action"},
                    {"id": "s3", "text": "Return result", "kind": "return"}
                ],
                "decisions": [],
                "calls": []
            },
            "risks": [],
            "diagram_suggestion": "flowchart"
        })
    }

    fn cobol_unit(code: &str) -> Value {
        let (start, end) = whole_file_range(code);
        let upper = code.to_uppercase();
        let name = paragraph_re()
            .captures(&upper)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| DEFAULT_PARAGRAPH.to_string());
        let id = normalize_id(&format!("u-{name}"), "u_main");
        json!({
            "kind": "cobol",
            "id": id,
            "name": name,
            "range": {"start_line": start, "end_line": end},
            "division": "PROCEDURE",
            "purpose": "Main paragraph (mock): validates and processes records.",
            "io": {
                "working_storage": [],
                "files": [],
                "inputs": [],
                "outputs": [],
                "side_effects": []
            },
            "control_flow": {"perform": [], "goto": [], "call": []},
            "logic": {
                "steps": [
                    {"id": "s1", "text": "Read input records", "kind": "io"},
                    {"id": "s2", "text": "Validate fields", "kind": "other"},
                    {"id": "s3", "text": "Write output", "kind": "io"},
                    {"id": "s4", "text": "EXIT", "kind": "exit"}
                ],
                "decisions": []
            },
            "diagram_suggestion": "flowchart",
            "notes": ""
        })
    }
}

impl UnitSource for MockUnitSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<Value>, GenerationError> {
        let unit = match request.kind {
            UnitKind::Cobol => Self::cobol_unit(request.code),
            UnitKind::Generic => Self::generic_unit(request.code),
        };
        Ok(vec![unit])
    }
}

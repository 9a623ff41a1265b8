//! Schema validation for normalized units and analysis documents.
//!
//! The normalizer only depends on the [`UnitValidator`] trait: a yes/no answer
//! plus a violation list. [`SchemaValidator`] is the built-in implementation
//! checking the unit schemas' structural constraints.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisDocument, Call, Step, Unit, UnitKind};
use crate::normalize::{
    is_valid_id, MAX_BRANCH_LABEL_CHARS, MAX_CONDITION_CHARS, MAX_PURPOSE_CHARS,
    MAX_STEP_TEXT_CHARS,
};

/// Version stamped on every analysis document.
pub const ANALYSIS_VERSION: &str = "1.0";

/// One schema violation, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validation capability consumed by the normalizer.
pub trait UnitValidator: Send + Sync {
    fn validate_unit(&self, unit: &Unit) -> Result<(), Vec<SchemaViolation>>;
}

/// Built-in validator for the `unit.generic` / `unit.cobol` schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl UnitValidator for SchemaValidator {
    fn validate_unit(&self, unit: &Unit) -> Result<(), Vec<SchemaViolation>> {
        let mut v = Violations::default();

        if !is_valid_id(unit.id()) {
            v.push("id", "must be 1-32 characters of [A-Za-z0-9_-]");
        }
        if unit.name().trim().is_empty() {
            v.push("name", "must not be empty");
        }
        let range = unit.range();
        if range.start_line < 1 {
            v.push("range.start_line", "must be >= 1");
        }
        if range.end_line < range.start_line {
            v.push("range.end_line", "must be >= start_line");
        }
        let purpose = unit.purpose();
        if purpose.trim().is_empty() {
            v.push("purpose", "must not be empty");
        } else if purpose.chars().count() > MAX_PURPOSE_CHARS {
            v.push("purpose", format!("must be at most {MAX_PURPOSE_CHARS} characters"));
        }

        let mut ids = HashSet::new();
        check_steps(unit.steps(), &mut ids, &mut v);

        match unit {
            Unit::Generic(u) => {
                for (idx, param) in u.signature.parameters.iter().enumerate() {
                    if param.name.trim().is_empty() {
                        v.push(format!("signature.parameters[{idx}].name"), "must not be empty");
                    }
                }
                for (idx, d) in u.logic.decisions.iter().enumerate() {
                    let at = format!("logic.decisions[{idx}]");
                    check_node_id(&d.id, &at, &mut ids, &mut v);
                    check_condition(&d.condition, &at, &mut v);
                    check_path(&d.true_path, &format!("{at}.true_path"), &mut v);
                    check_path(&d.false_path, &format!("{at}.false_path"), &mut v);
                }
                check_calls(&u.logic.calls, &mut v);
            }
            Unit::Cobol(u) => {
                for (idx, d) in u.logic.decisions.iter().enumerate() {
                    let at = format!("logic.decisions[{idx}]");
                    check_node_id(&d.id, &at, &mut ids, &mut v);
                    check_condition(&d.condition, &at, &mut v);
                    for (bidx, branch) in d.branches.iter().enumerate() {
                        let bat = format!("{at}.branches[{bidx}]");
                        if branch.label.chars().count() > MAX_BRANCH_LABEL_CHARS {
                            v.push(
                                format!("{bat}.label"),
                                format!("must be at most {MAX_BRANCH_LABEL_CHARS} characters"),
                            );
                        }
                        check_path(&branch.path, &format!("{bat}.path"), &mut v);
                    }
                }
            }
        }

        v.finish()
    }
}

#[derive(Default)]
struct Violations(Vec<SchemaViolation>);

impl Violations {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(SchemaViolation::new(path, message));
    }

    fn finish(self) -> Result<(), Vec<SchemaViolation>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

fn check_steps<'a>(steps: &'a [Step], ids: &mut HashSet<&'a str>, v: &mut Violations) {
    if steps.is_empty() {
        v.push("logic.steps", "must contain at least one step");
    }
    for (idx, step) in steps.iter().enumerate() {
        let at = format!("logic.steps[{idx}]");
        check_node_id(&step.id, &at, ids, v);
        if step.text.chars().count() > MAX_STEP_TEXT_CHARS {
            v.push(
                format!("{at}.text"),
                format!("must be at most {MAX_STEP_TEXT_CHARS} characters"),
            );
        }
    }
}

/// Steps and decisions share one id namespace.
fn check_node_id<'a>(id: &'a str, at: &str, ids: &mut HashSet<&'a str>, v: &mut Violations) {
    if !is_valid_id(id) {
        v.push(format!("{at}.id"), "must be 1-32 characters of [A-Za-z0-9_-]");
    } else if !ids.insert(id) {
        v.push(format!("{at}.id"), format!("duplicate id '{id}'"));
    }
}

fn check_condition(condition: &str, at: &str, v: &mut Violations) {
    if condition.chars().count() > MAX_CONDITION_CHARS {
        v.push(
            format!("{at}.condition"),
            format!("must be at most {MAX_CONDITION_CHARS} characters"),
        );
    }
}

fn check_path(path: &[String], at: &str, v: &mut Violations) {
    for (idx, id) in path.iter().enumerate() {
        if !is_valid_id(id) {
            v.push(format!("{at}[{idx}]"), "must be a valid step/decision id");
        }
    }
}

fn check_calls(calls: &[Call], v: &mut Violations) {
    for (idx, call) in calls.iter().enumerate() {
        if call.kind.trim().is_empty() {
            v.push(format!("logic.calls[{idx}].kind"), "must not be empty");
        }
    }
}

/// Validate a whole analysis document, including every unit against its kind schema.
pub fn validate_document(
    doc: &AnalysisDocument,
    validator: &dyn UnitValidator,
) -> Result<(), Vec<SchemaViolation>> {
    let mut v = Violations::default();
    if doc.version.trim().is_empty() {
        v.push("version", "must not be empty");
    }
    if doc.file.path.trim().is_empty() {
        v.push("file.path", "must not be empty");
    }
    if doc.language.trim().is_empty() {
        v.push("language", "must not be empty");
    }
    if !(0.0..=1.0).contains(&doc.detector.confidence) {
        v.push("detector.confidence", "must be within 0..=1");
    }
    if doc.units.is_empty() {
        v.push("units", "must contain at least one unit");
    }
    if doc.summary.unit_count != doc.units.len() {
        v.push(
            "summary.unit_count",
            format!("is {} but the document has {} units", doc.summary.unit_count, doc.units.len()),
        );
    }
    for (idx, unit) in doc.units.iter().enumerate() {
        if let Err(errors) = validator.validate_unit(unit) {
            v.0.extend(errors.into_iter().map(|e| {
                SchemaViolation::new(format!("units[{idx}].{}", e.path), e.message)
            }));
        }
    }
    v.finish()
}

/// Top-level field names of a unit schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSchema {
    pub kind: UnitKind,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

const GENERIC_SCHEMA: UnitSchema = UnitSchema {
    kind: UnitKind::Generic,
    required: &["kind", "id", "name", "range", "signature", "purpose", "io", "logic"],
    optional: &["risks", "diagram_suggestion"],
};

const COBOL_SCHEMA: UnitSchema = UnitSchema {
    kind: UnitKind::Cobol,
    required: &["kind", "id", "name", "range", "purpose", "io", "logic"],
    optional: &["division", "control_flow", "diagram_suggestion", "notes"],
};

pub fn unit_schema(kind: UnitKind) -> UnitSchema {
    match kind {
        UnitKind::Generic => GENERIC_SCHEMA,
        UnitKind::Cobol => COBOL_SCHEMA,
    }
}

/// Compact schema description for generator prompts.
pub fn schema_summary(kind: UnitKind) -> String {
    let schema = unit_schema(kind);
    format!(
        "Required fields: {}. Other fields: {}",
        schema.required.join(", "),
        schema.optional.join(", ")
    )
}

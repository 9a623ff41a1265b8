//! Unit normalizer: turns untrusted unit-like JSON records into schema-valid [`Unit`]s.
//!
//! Every record goes through a fixed repair pipeline (range, signature,
//! purpose, I/O, steps, decisions, calls, risks, id/name). Each repaired unit
//! is validated once; on failure a single repair retry runs (synthesize a step
//! when `steps` is empty) before the unit is dropped. If nothing survives, a
//! deterministic fallback unit is produced, so callers always get at least one
//! unit back.

pub mod coerce;
pub mod ids;
pub mod signature;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{
    Branch, Call, CobolDecision, CobolIo, CobolLogic, CobolUnit, ControlFlow, Decision,
    DiagramType, GenericIo, GenericLogic, GenericUnit, LineRange, Parameter, Signature, Step,
    StepKind, Unit, UnitKind,
};
use crate::schema::{SchemaValidator, UnitValidator};

use self::coerce::{
    coerce_int, display_string, first_truthy, stringify_list, text_field, to_string_list,
    truncate_chars,
};
pub use self::ids::{is_valid_id, normalize_id, IdRegistry, MAX_ID_LEN};
pub use self::signature::parse_signature;

pub const FALLBACK_UNIT_ID: &str = "u_main";
pub const FALLBACK_UNIT_NAME: &str = "main";

pub const MAX_PURPOSE_CHARS: usize = 200;
pub const MAX_STEP_TEXT_CHARS: usize = 60;
pub const MAX_CONDITION_CHARS: usize = 300;
pub const MAX_BRANCH_LABEL_CHARS: usize = 60;

/// Result of normalizing one batch of raw records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Never empty.
    pub units: Vec<Unit>,
    /// Records that were not objects or failed validation after the retry.
    pub dropped: usize,
    /// True when `units` holds only the synthesized fallback unit.
    pub fallback: bool,
}

/// Split a generator payload into records: an array yields its items, a lone
/// object is wrapped, anything else yields nothing.
pub fn records_from_value(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    }
}

/// Normalize with the built-in schema validator.
pub fn normalize(raw: &[Value], kind: UnitKind) -> Vec<Unit> {
    Normalizer::new(kind, &SchemaValidator).normalize(raw).units
}

/// Configured normalizer for one analysis request.
pub struct Normalizer<'a> {
    kind: UnitKind,
    validator: &'a dyn UnitValidator,
    line_count: usize,
}

impl<'a> Normalizer<'a> {
    pub fn new(kind: UnitKind, validator: &'a dyn UnitValidator) -> Self {
        Self { kind, validator, line_count: 1 }
    }

    /// Number of lines in the analyzed file; sizes the fallback unit's range.
    pub fn with_line_count(mut self, line_count: usize) -> Self {
        self.line_count = line_count.max(1);
        self
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Repair, validate and collect `raw`. Never fails; output order follows input order.
    pub fn normalize(&self, raw: &[Value]) -> NormalizeOutcome {
        let mut units = Vec::with_capacity(raw.len());
        let mut dropped = 0usize;

        for (idx, record) in raw.iter().enumerate() {
            let Some(obj) = record.as_object() else {
                warn!(index = idx, "discarding non-object unit record");
                dropped += 1;
                continue;
            };
            match self.admit(repair_unit(obj, self.kind)) {
                Some(unit) => units.push(unit),
                None => dropped += 1,
            }
        }

        if units.is_empty() {
            warn!(dropped, "no unit survived normalization; using fallback unit");
            return NormalizeOutcome {
                units: vec![self.fallback_unit("no valid unit was produced")],
                dropped,
                fallback: true,
            };
        }
        NormalizeOutcome { units, dropped, fallback: false }
    }

    /// Deterministic single-step unit used when nothing else is usable.
    pub fn fallback_unit(&self, reason: &str) -> Unit {
        let purpose = truncate_chars(&format!("Fallback: {reason}"), MAX_PURPOSE_CHARS);
        let steps = vec![Step {
            id: "s1".to_string(),
            text: truncate_chars(&purpose, MAX_STEP_TEXT_CHARS),
            kind: StepKind::Action,
        }];
        let range = LineRange::new(1, u32::try_from(self.line_count).unwrap_or(u32::MAX));
        match self.kind {
            UnitKind::Generic => Unit::Generic(GenericUnit {
                id: FALLBACK_UNIT_ID.to_string(),
                name: FALLBACK_UNIT_NAME.to_string(),
                range,
                signature: Signature::default(),
                purpose,
                io: GenericIo::default(),
                logic: GenericLogic { steps, decisions: Vec::new(), calls: Vec::new() },
                risks: Vec::new(),
                diagram_suggestion: None,
            }),
            UnitKind::Cobol => Unit::Cobol(CobolUnit {
                id: FALLBACK_UNIT_ID.to_string(),
                name: FALLBACK_UNIT_NAME.to_string(),
                range,
                division: None,
                purpose,
                io: CobolIo::default(),
                control_flow: ControlFlow::default(),
                logic: CobolLogic { steps, decisions: Vec::new() },
                diagram_suggestion: None,
                notes: None,
            }),
        }
    }

    /// Validate, retry once with a synthesized step, or drop.
    fn admit(&self, mut unit: Unit) -> Option<Unit> {
        match self.validator.validate_unit(&unit) {
            Ok(()) => return Some(unit),
            Err(violations) => {
                debug!(unit_id = unit.id(), ?violations, "unit failed validation; retrying repair")
            }
        }
        ensure_steps(&mut unit);
        match self.validator.validate_unit(&unit) {
            Ok(()) => Some(unit),
            Err(violations) => {
                warn!(unit_id = unit.id(), ?violations, "dropping unit after repair retry");
                None
            }
        }
    }
}

/// Retry repair: give a step-less unit one action step built from its purpose.
fn ensure_steps(unit: &mut Unit) {
    let (purpose, decision_ids, steps): (&str, Vec<&str>, &mut Vec<Step>) = match unit {
        Unit::Generic(u) => (
            u.purpose.as_str(),
            u.logic.decisions.iter().map(|d| d.id.as_str()).collect(),
            &mut u.logic.steps,
        ),
        Unit::Cobol(u) => (
            u.purpose.as_str(),
            u.logic.decisions.iter().map(|d| d.id.as_str()).collect(),
            &mut u.logic.steps,
        ),
    };
    if !steps.is_empty() {
        return;
    }
    let mut registry = IdRegistry::new();
    for id in decision_ids {
        registry.register(id, id);
    }
    let id = registry.register("s1", "s1");
    let text = truncate_chars(purpose, MAX_STEP_TEXT_CHARS);
    steps.push(Step { id, text, kind: StepKind::Action });
}

/// Per-record repair pipeline. Unknown keys are ignored.
pub fn repair_unit(raw: &Map<String, Value>, kind: UnitKind) -> Unit {
    let raw_id = text_field(raw, &["id"]);
    let id = normalize_id(raw_id.as_deref().unwrap_or(FALLBACK_UNIT_ID), FALLBACK_UNIT_ID);
    let raw_name = text_field(raw, &["name"])
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let name = raw_name.clone().unwrap_or_else(|| id.clone());
    let label = raw_name.or(raw_id).unwrap_or_else(|| "unit".to_string());

    let range = repair_range(raw.get("range"));
    let purpose = repair_purpose(raw.get("purpose"), &label);
    let diagram_suggestion =
        raw.get("diagram_suggestion").and_then(Value::as_str).and_then(DiagramType::parse);
    let empty = Map::new();
    let io = raw.get("io").and_then(Value::as_object).unwrap_or(&empty);
    // Flat records carry steps/decisions/calls at the top level.
    let logic = raw.get("logic").and_then(Value::as_object).unwrap_or(raw);

    let mut registry = IdRegistry::new();
    let steps = repair_steps(logic.get("steps"), &mut registry);

    match kind {
        UnitKind::Generic => {
            let decisions = repair_decisions(logic.get("decisions"), &mut registry);
            Unit::Generic(GenericUnit {
                id,
                name,
                range,
                signature: repair_signature(raw.get("signature")),
                purpose,
                io: GenericIo {
                    inputs: to_string_list(io.get("inputs")),
                    outputs: to_string_list(io.get("outputs")),
                    side_effects: to_string_list(io.get("side_effects")),
                },
                logic: GenericLogic { steps, decisions, calls: repair_calls(logic.get("calls")) },
                risks: stringify_list(raw.get("risks")),
                diagram_suggestion,
            })
        }
        UnitKind::Cobol => {
            let decisions = repair_cobol_decisions(logic.get("decisions"), &mut registry);
            let flow = raw.get("control_flow").and_then(Value::as_object).unwrap_or(&empty);
            Unit::Cobol(CobolUnit {
                id,
                name,
                range,
                division: text_field(raw, &["division"]).map(|d| d.trim().to_uppercase()),
                purpose,
                io: CobolIo {
                    working_storage: to_string_list(io.get("working_storage")),
                    files: to_string_list(io.get("files")),
                    inputs: to_string_list(io.get("inputs")),
                    outputs: to_string_list(io.get("outputs")),
                    side_effects: to_string_list(io.get("side_effects")),
                },
                control_flow: ControlFlow {
                    perform: to_string_list(flow.get("perform")),
                    goto: to_string_list(flow.get("goto")),
                    call: to_string_list(flow.get("call")),
                },
                logic: CobolLogic { steps, decisions },
                diagram_suggestion,
                notes: text_field(raw, &["notes"]),
            })
        }
    }
}

/// Missing or non-numeric bounds give `(1, 1)`; an inverted end is raised to the start.
pub fn repair_range(raw: Option<&Value>) -> LineRange {
    let Some(obj) = raw.and_then(Value::as_object) else {
        return LineRange::default();
    };
    let start = match first_truthy(obj, &["start_line"]) {
        Some(v) => coerce_int(v),
        None => Some(1),
    };
    let end = match first_truthy(obj, &["end_line"]) {
        Some(v) => coerce_int(v),
        None => start,
    };
    let (Some(start), Some(end)) = (start, end) else {
        debug!("range bounds are not integers; defaulting to 1..1");
        return LineRange::default();
    };
    let clamp = |n: i64| u32::try_from(n.max(1)).unwrap_or(u32::MAX);
    let range = LineRange::new(clamp(start), clamp(end));
    if end < start {
        debug!(start, end, "inverted range repaired");
    }
    range
}

fn repair_purpose(raw: Option<&Value>, label: &str) -> String {
    let text = raw.and_then(display_string).unwrap_or_default();
    let purpose = truncate_chars(text.trim(), MAX_PURPOSE_CHARS);
    if purpose.trim().is_empty() {
        format!("Auto-generated for {label}")
    } else {
        purpose
    }
}

/// Free text is parsed; a record keeps `parameters`/`returns` only.
pub fn repair_signature(raw: Option<&Value>) -> Signature {
    match raw {
        Some(Value::String(text)) => parse_signature(text),
        Some(Value::Object(obj)) => {
            let parameters = match obj.get("parameters") {
                Some(Value::Array(items)) => items.iter().filter_map(repair_parameter).collect(),
                _ => Vec::new(),
            };
            Signature { parameters, returns: text_field(obj, &["returns"]) }
        }
        _ => Signature::default(),
    }
}

fn repair_parameter(raw: &Value) -> Option<Parameter> {
    match raw {
        Value::Null => None,
        Value::Object(obj) => Some(Parameter {
            name: text_field(obj, &["name"]).unwrap_or_else(|| "param".to_string()),
            ty: text_field(obj, &["type"]),
            description: text_field(obj, &["description"]),
        }),
        other => display_string(other).map(Parameter::named),
    }
}

fn repair_steps(raw: Option<&Value>, registry: &mut IdRegistry) -> Vec<Step> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    let mut steps = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let fallback = format!("s{}", idx + 1);
        let (raw_id, text, kind) = match item {
            Value::Object(obj) => {
                let kind = text_field(obj, &["kind"]);
                let parsed = kind.as_deref().and_then(StepKind::parse);
                if kind.is_some() && parsed.is_none() {
                    debug!(kind = kind.as_deref(), "unknown step kind forced to action");
                }
                (
                    text_field(obj, &["id"]).unwrap_or_else(|| fallback.clone()),
                    text_field(obj, &["text", "label"]).unwrap_or_default(),
                    parsed.unwrap_or(StepKind::Action),
                )
            }
            Value::Null | Value::Array(_) => continue,
            scalar => {
                (fallback.clone(), display_string(scalar).unwrap_or_default(), StepKind::Action)
            }
        };
        let id = registry.register(&raw_id, &fallback);
        steps.push(Step { id, text: truncate_chars(text.trim(), MAX_STEP_TEXT_CHARS), kind });
    }
    steps
}

/// Register every decision id first so paths can reference later decisions.
fn register_decisions<'v>(
    raw: Option<&'v Value>,
    registry: &mut IdRegistry,
) -> Vec<(String, String, Option<&'v Map<String, Value>>)> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let fallback = format!("d{}", idx + 1);
        let (raw_id, condition, obj) = match item {
            Value::Object(obj) => (
                text_field(obj, &["id"]).unwrap_or_else(|| fallback.clone()),
                text_field(obj, &["condition", "text"]).unwrap_or_default(),
                Some(obj),
            ),
            Value::Null => continue,
            other => (fallback.clone(), display_string(other).unwrap_or_default(), None),
        };
        let id = registry.register(&raw_id, &fallback);
        out.push((id, truncate_chars(&condition, MAX_CONDITION_CHARS), obj));
    }
    out
}

fn repair_decisions(raw: Option<&Value>, registry: &mut IdRegistry) -> Vec<Decision> {
    let registered = register_decisions(raw, registry);
    let registry: &IdRegistry = registry;
    registered
        .into_iter()
        .map(|(id, condition, obj)| {
            let path =
                |key: &str| obj.map(|o| repair_path(o.get(key), registry)).unwrap_or_default();
            Decision { true_path: path("true_path"), false_path: path("false_path"), id, condition }
        })
        .collect()
}

fn repair_cobol_decisions(raw: Option<&Value>, registry: &mut IdRegistry) -> Vec<CobolDecision> {
    let registered = register_decisions(raw, registry);
    let registry: &IdRegistry = registry;
    registered
        .into_iter()
        .map(|(id, condition, obj)| {
            let branches = match obj.and_then(|o| o.get("branches")) {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|b| Branch {
                        label: truncate_chars(
                            text_field(b, &["label"]).unwrap_or_default().trim(),
                            MAX_BRANCH_LABEL_CHARS,
                        ),
                        path: repair_path(b.get("path"), registry),
                    })
                    .collect(),
                _ => Vec::new(),
            };
            CobolDecision { id, condition, branches }
        })
        .collect()
}

fn repair_path(raw: Option<&Value>, registry: &IdRegistry) -> Vec<String> {
    match raw {
        Some(Value::Array(items)) => {
            items.iter().filter_map(display_string).map(|rid| registry.resolve(&rid)).collect()
        }
        _ => Vec::new(),
    }
}

fn repair_calls(raw: Option<&Value>) -> Vec<Call> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(Call {
                target: text_field(obj, &["target"]),
                kind: text_field(obj, &["kind"])
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| "other".to_string()),
            }),
            Value::String(target) => {
                Some(Call { target: Some(target.clone()), kind: "other".to_string() })
            }
            _ => None,
        })
        .collect()
}

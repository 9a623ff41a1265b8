//! Core data model for detections, analyzed units, and rendered diagrams.
//!
//! Every type here is produced by the detector, the normalizer, or the diagram
//! layer and is immutable afterwards. The serde shapes are the wire shapes of
//! the analysis document and the diagram bundle.

use serde::{Deserialize, Serialize};

/// How a [`Detection`] was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// File extension matched a known table entry.
    Extension,
    /// Content sample matched a keyword or shebang hint.
    Heuristic,
    /// Nothing matched; the language is a best guess.
    Mixed,
}

impl DetectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::Extension => "extension",
            DetectionMethod::Heuristic => "heuristic",
            DetectionMethod::Mixed => "mixed",
        }
    }
}

/// Language identification result for a single source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub language: String,
    pub method: DetectionMethod,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
}

impl Detection {
    pub fn new(language: impl Into<String>, method: DetectionMethod, confidence: f64) -> Self {
        Self { language: language.into(), method, confidence: confidence.clamp(0.0, 1.0) }
    }
}

/// Unit variant discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Generic,
    Cobol,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Generic => "generic",
            UnitKind::Cobol => "cobol",
        }
    }

    /// Units for COBOL sources use the paragraph-oriented variant; everything else is generic.
    pub fn for_language(language: &str) -> Self {
        if language.eq_ignore_ascii_case("cobol") {
            UnitKind::Cobol
        } else {
            UnitKind::Generic
        }
    }
}

/// Inclusive 1-based line span. `end_line >= start_line >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl LineRange {
    /// Build a range, repairing a zero start and an inverted end.
    pub fn new(start_line: u32, end_line: u32) -> Self {
        let start_line = start_line.max(1);
        Self { start_line, end_line: end_line.max(start_line) }
    }
}

impl Default for LineRange {
    fn default() -> Self {
        Self { start_line: 1, end_line: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub description: Option<String>,
}

impl Parameter {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ty: None, description: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub returns: Option<String>,
}

/// Step classification. Anything outside this set is repaired to `Action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Action,
    Io,
    Calc,
    Loop,
    Assign,
    Return,
    Try,
    Catch,
    Finally,
    Exit,
    Other,
}

impl StepKind {
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw.trim().to_ascii_lowercase().as_str() {
            "action" => StepKind::Action,
            "io" => StepKind::Io,
            "calc" => StepKind::Calc,
            "loop" => StepKind::Loop,
            "assign" => StepKind::Assign,
            "return" => StepKind::Return,
            "try" => StepKind::Try,
            "catch" => StepKind::Catch,
            "finally" => StepKind::Finally,
            "exit" => StepKind::Exit,
            "other" => StepKind::Other,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Action => "action",
            StepKind::Io => "io",
            StepKind::Calc => "calc",
            StepKind::Loop => "loop",
            StepKind::Assign => "assign",
            StepKind::Return => "return",
            StepKind::Try => "try",
            StepKind::Catch => "catch",
            StepKind::Finally => "finally",
            StepKind::Exit => "exit",
            StepKind::Other => "other",
        }
    }
}

/// One sequential action within a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub text: String,
    pub kind: StepKind,
}

/// Two-way branch point of a generic unit. Paths hold step/decision ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub condition: String,
    pub true_path: Vec<String>,
    pub false_path: Vec<String>,
}

/// Labeled outgoing path of a COBOL decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub label: String,
    pub path: Vec<String>,
}

/// Multi-way branch point of a COBOL unit (`EVALUATE`, nested `IF`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CobolDecision {
    pub id: String,
    pub condition: String,
    pub branches: Vec<Branch>,
}

/// Reference from a unit to an external dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub target: Option<String>,
    /// Lower-cased; usually one of `api`, `db`, `queue`, `other`.
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericIo {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CobolIo {
    pub working_storage: Vec<String>,
    pub files: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericLogic {
    pub steps: Vec<Step>,
    pub decisions: Vec<Decision>,
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CobolLogic {
    pub steps: Vec<Step>,
    pub decisions: Vec<CobolDecision>,
}

/// `PERFORM` / `GO TO` / `CALL` targets of a paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlow {
    pub perform: Vec<String>,
    pub goto: Vec<String>,
    pub call: Vec<String>,
}

/// Diagram family selected for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Flowchart,
    Sequence,
    State,
    Class,
    Er,
    Dfd,
    None,
}

impl DiagramType {
    pub fn parse(raw: &str) -> Option<Self> {
        let ty = match raw.trim().to_ascii_lowercase().as_str() {
            "flowchart" => DiagramType::Flowchart,
            "sequence" => DiagramType::Sequence,
            "state" => DiagramType::State,
            "class" => DiagramType::Class,
            "er" => DiagramType::Er,
            "dfd" => DiagramType::Dfd,
            "none" => DiagramType::None,
            _ => return None,
        };
        Some(ty)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramType::Flowchart => "flowchart",
            DiagramType::Sequence => "sequence",
            DiagramType::State => "state",
            DiagramType::Class => "class",
            DiagramType::Er => "er",
            DiagramType::Dfd => "dfd",
            DiagramType::None => "none",
        }
    }
}

/// A function, method, or other logical block of a non-COBOL source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericUnit {
    pub id: String,
    pub name: String,
    pub range: LineRange,
    pub signature: Signature,
    pub purpose: String,
    pub io: GenericIo,
    pub logic: GenericLogic,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_suggestion: Option<DiagramType>,
}

/// A COBOL paragraph or section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CobolUnit {
    pub id: String,
    pub name: String,
    pub range: LineRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    pub purpose: String,
    pub io: CobolIo,
    #[serde(default)]
    pub control_flow: ControlFlow,
    pub logic: CobolLogic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_suggestion: Option<DiagramType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Canonical, schema-valid analyzed unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Unit {
    Generic(GenericUnit),
    Cobol(CobolUnit),
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Generic(_) => UnitKind::Generic,
            Unit::Cobol(_) => UnitKind::Cobol,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Unit::Generic(u) => &u.id,
            Unit::Cobol(u) => &u.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Unit::Generic(u) => &u.name,
            Unit::Cobol(u) => &u.name,
        }
    }

    pub fn range(&self) -> LineRange {
        match self {
            Unit::Generic(u) => u.range,
            Unit::Cobol(u) => u.range,
        }
    }

    pub fn purpose(&self) -> &str {
        match self {
            Unit::Generic(u) => &u.purpose,
            Unit::Cobol(u) => &u.purpose,
        }
    }

    pub fn steps(&self) -> &[Step] {
        match self {
            Unit::Generic(u) => &u.logic.steps,
            Unit::Cobol(u) => &u.logic.steps,
        }
    }

    pub fn diagram_suggestion(&self) -> Option<DiagramType> {
        match self {
            Unit::Generic(u) => u.diagram_suggestion,
            Unit::Cobol(u) => u.diagram_suggestion,
        }
    }
}

/// Source file metadata carried by the analysis document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub sha: Option<String>,
    pub repo: Option<String>,
    pub owner: Option<String>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorInfo {
    pub method: DetectionMethod,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub unit_count: usize,
    pub diagram_suggestion: DiagramType,
    /// Human-readable notes about fallbacks and dropped records; empty when none.
    #[serde(default)]
    pub notes: String,
}

/// Versioned analysis document for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub version: String,
    pub file: FileInfo,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub language: String,
    pub detector: DetectorInfo,
    pub units: Vec<Unit>,
    pub summary: AnalysisSummary,
}

/// Rendered diagram for a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    pub unit_id: String,
    pub unit_name: String,
    #[serde(rename = "type")]
    pub diagram_type: DiagramType,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramBundle {
    pub diagrams: Vec<Diagram>,
}

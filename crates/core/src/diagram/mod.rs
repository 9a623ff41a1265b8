//! Diagram classification and rendering.
//!
//! Rendering always produces flowchart syntax; the classifier's choice travels
//! alongside the code as the diagram `type`.

pub mod classify;
pub mod flowchart;

pub use classify::{classify, text_blob};
pub use flowchart::{clean_label, render, MAX_LABEL_CHARS};

use crate::model::{AnalysisDocument, Diagram, DiagramBundle, DiagramType, Unit};

/// Diagram type surfaced for a unit: its own suggestion when present, else the classifier's.
pub fn diagram_type_for(unit: &Unit) -> DiagramType {
    unit.diagram_suggestion().unwrap_or_else(|| classify(unit))
}

pub fn diagram_for(unit: &Unit) -> Diagram {
    Diagram {
        unit_id: unit.id().to_string(),
        unit_name: unit.name().to_string(),
        diagram_type: diagram_type_for(unit),
        code: render(unit),
    }
}

/// One diagram per unit, in document order.
pub fn to_bundle(doc: &AnalysisDocument) -> DiagramBundle {
    DiagramBundle { diagrams: doc.units.iter().map(diagram_for).collect() }
}

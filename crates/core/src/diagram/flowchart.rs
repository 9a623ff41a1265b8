//! Deterministic flowchart rendering (Mermaid `flowchart TD` syntax).

use crate::model::{CobolUnit, GenericUnit, Step, Unit};

/// Longest label kept before truncation with an ellipsis.
pub const MAX_LABEL_CHARS: usize = 60;

const ELLIPSIS: char = '…';
const TRUE_LABEL: &str = "Sim";
const FALSE_LABEL: &str = "Não";

/// Whitespace runs collapse to one space; long labels end in `…`; `|` and `"` are replaced.
pub fn clean_label(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = if collapsed.chars().count() > MAX_LABEL_CHARS {
        let mut cut: String = collapsed.chars().take(MAX_LABEL_CHARS - 1).collect();
        cut.push(ELLIPSIS);
        cut
    } else {
        collapsed
    };
    truncated.replace('|', "/").replace('"', "'")
}

#[derive(Clone, Copy)]
enum Shape {
    Pill,
    Rect,
    Diamond,
}

fn node(id: &str, label: &str, shape: Shape) -> String {
    let label = clean_label(label);
    match shape {
        Shape::Pill => format!("{id}([\"{label}\"])"),
        Shape::Rect => format!("{id}[\"{label}\"]"),
        Shape::Diamond => format!("{id}{{\"{label}\"}}"),
    }
}

fn edge(from: &str, to: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => {
            format!("{from} -- \"{}\" --> {to}", clean_label(label))
        }
        _ => format!("{from} --> {to}"),
    }
}

/// Node ids for the synthetic terminals; COBOL diagrams use lowercase ids.
struct Terminals {
    start: &'static str,
    end: &'static str,
}

const GENERIC_TERMINALS: Terminals = Terminals { start: "START", end: "END" };
const COBOL_TERMINALS: Terminals = Terminals { start: "start", end: "end" };

/// Render `unit` as flowchart text. Identical input always yields identical output.
pub fn render(unit: &Unit) -> String {
    match unit {
        Unit::Generic(u) => render_generic(u),
        Unit::Cobol(u) => render_cobol(u),
    }
}

fn render_generic(unit: &GenericUnit) -> String {
    let mut lines = header(&GENERIC_TERMINALS);
    push_steps(&mut lines, &unit.logic.steps);

    for d in &unit.logic.decisions {
        lines.push(node(&d.id, decision_label(&d.condition, &d.id), Shape::Diamond));
        if let Some(target) = d.true_path.first() {
            lines.push(edge(&d.id, target, Some(TRUE_LABEL)));
        }
        if let Some(target) = d.false_path.first() {
            lines.push(edge(&d.id, target, Some(FALSE_LABEL)));
        }
    }

    push_chain(&mut lines, &unit.logic.steps, &GENERIC_TERMINALS);
    lines.join("\n")
}

fn render_cobol(unit: &CobolUnit) -> String {
    let mut lines = header(&COBOL_TERMINALS);
    push_steps(&mut lines, &unit.logic.steps);

    for d in &unit.logic.decisions {
        lines.push(node(&d.id, decision_label(&d.condition, &d.id), Shape::Diamond));
        for branch in &d.branches {
            if let Some(target) = branch.path.first() {
                lines.push(edge(&d.id, target, Some(&branch.label)));
            }
        }
    }

    push_chain(&mut lines, &unit.logic.steps, &COBOL_TERMINALS);
    lines.join("\n")
}

fn header(terminals: &Terminals) -> Vec<String> {
    vec![
        "flowchart TD".to_string(),
        node(terminals.start, "Start", Shape::Pill),
        node(terminals.end, "End", Shape::Pill),
    ]
}

fn decision_label<'a>(condition: &'a str, id: &'a str) -> &'a str {
    if condition.trim().is_empty() {
        id
    } else {
        condition
    }
}

fn push_steps(lines: &mut Vec<String>, steps: &[Step]) {
    for step in steps {
        let label = if !step.text.is_empty() {
            step.text.as_str()
        } else {
            step.kind.as_str()
        };
        lines.push(node(&step.id, label, Shape::Rect));
    }
}

fn push_chain(lines: &mut Vec<String>, steps: &[Step], terminals: &Terminals) {
    let (Some(first), Some(last)) = (steps.first(), steps.last()) else {
        lines.push(edge(terminals.start, terminals.end, None));
        return;
    };
    lines.push(edge(terminals.start, &first.id, None));
    for pair in steps.windows(2) {
        lines.push(edge(&pair[0].id, &pair[1].id, None));
    }
    lines.push(edge(&last.id, terminals.end, None));
}

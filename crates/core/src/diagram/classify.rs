//! Heuristic diagram-type selection from a unit's structural signals.
//!
//! First match wins:
//! 1. COBOL units are procedural paragraphs: `flowchart`.
//! 2. Many distinct external interactions: `sequence`.
//! 3. State/approval vocabulary with a 3+-way decision and at most one call: `state`.
//! 4. Decision-light, I/O-heavy, database-touching units: `dfd`.
//! 5. Otherwise `flowchart`.

use std::collections::HashSet;

use crate::model::{DiagramType, Unit};

const EXTERNAL_CALL_KINDS: &[&str] = &["api", "db", "queue", "other"];

const STATE_WORDS: &[&str] = &["state", "status", "phase", "stage", "situacao"];
const APPROVAL_WORDS: &[&str] =
    &["pending", "approved", "rejected", "cancelled", "failed", "success"];
const TABLE_WORDS: &[&str] = &["db", "table", "tabela"];

const SEQUENCE_MIN_PAIRS: usize = 3;
const SEQUENCE_MIN_KINDS: usize = 2;
const SEQUENCE_MIN_MIXED_PAIRS: usize = 2;
const STATE_MIN_BRANCHES: usize = 3;
const STATE_MAX_CALLS: usize = 1;
const DFD_MAX_DECISIONS: usize = 1;
const DFD_MIN_IO: usize = 6;

/// Pick the diagram type for `unit`. Pure and deterministic.
pub fn classify(unit: &Unit) -> DiagramType {
    let u = match unit {
        Unit::Cobol(_) => return DiagramType::Flowchart,
        Unit::Generic(u) => u,
    };
    let calls = &u.logic.calls;

    let external: Vec<_> =
        calls.iter().filter(|c| EXTERNAL_CALL_KINDS.contains(&c.kind.as_str())).collect();
    let pairs: HashSet<(&str, String)> = external
        .iter()
        .filter_map(|c| {
            let target = c.target.as_deref().filter(|t| !t.is_empty())?;
            Some((c.kind.as_str(), target.to_lowercase()))
        })
        .collect();
    let kinds: HashSet<&str> = external.iter().map(|c| c.kind.as_str()).collect();
    if pairs.len() >= SEQUENCE_MIN_PAIRS
        || (kinds.len() >= SEQUENCE_MIN_KINDS && pairs.len() >= SEQUENCE_MIN_MIXED_PAIRS)
    {
        return DiagramType::Sequence;
    }

    let blob = text_blob(unit);
    let hints_state = STATE_WORDS.iter().chain(APPROVAL_WORDS).any(|w| blob.contains(w));
    let many_branches = u.logic.decisions.iter().any(|d| {
        let out_edges =
            usize::from(!d.true_path.is_empty()) + usize::from(!d.false_path.is_empty());
        out_edges >= STATE_MIN_BRANCHES
    });
    if hints_state && many_branches && external.len() <= STATE_MAX_CALLS {
        return DiagramType::State;
    }

    let io_count = u.io.inputs.len() + u.io.outputs.len() + u.io.side_effects.len();
    let has_db = calls.iter().any(|c| c.kind.contains("db"))
        || TABLE_WORDS.iter().any(|w| blob.contains(w));
    if u.logic.decisions.len() <= DFD_MAX_DECISIONS && io_count >= DFD_MIN_IO && has_db {
        return DiagramType::Dfd;
    }

    DiagramType::Flowchart
}

/// Lower-cased text of steps, decisions, calls and I/O with every run of
/// characters outside `[a-z0-9_]` collapsed to one space.
pub fn text_blob(unit: &Unit) -> String {
    let mut parts: Vec<&str> = Vec::new();
    match unit {
        Unit::Generic(u) => {
            parts.extend(u.logic.steps.iter().map(|s| s.text.as_str()));
            parts.extend(u.logic.decisions.iter().map(|d| d.condition.as_str()));
            for call in &u.logic.calls {
                parts.push(call.target.as_deref().unwrap_or(""));
                parts.push(&call.kind);
            }
            parts.extend(u.io.side_effects.iter().map(String::as_str));
            parts.extend(u.io.inputs.iter().map(String::as_str));
            parts.extend(u.io.outputs.iter().map(String::as_str));
        }
        Unit::Cobol(u) => {
            parts.extend(u.logic.steps.iter().map(|s| s.text.as_str()));
            for d in &u.logic.decisions {
                parts.push(&d.condition);
                parts.extend(d.branches.iter().map(|b| b.label.as_str()));
            }
            parts.extend(u.io.side_effects.iter().map(String::as_str));
            parts.extend(u.io.inputs.iter().map(String::as_str));
            parts.extend(u.io.outputs.iter().map(String::as_str));
        }
    }

    let lower = parts.join(" ").to_lowercase();
    let mut blob = String::with_capacity(lower.len());
    let mut in_gap = false;
    for c in lower.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            blob.push(c);
            in_gap = false;
        } else if !in_gap {
            blob.push(' ');
            in_gap = true;
        }
    }
    blob
}

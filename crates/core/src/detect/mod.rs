//! Language detection from a file path and an optional content sample.
//!
//! Priority: extension table, then content heuristics (COBOL divisions,
//! shebang interpreter), then an `unknown` fallback. Always returns a
//! [`Detection`]; never performs IO.

use std::path::Path;

use tracing::debug;

use crate::model::{Detection, DetectionMethod};

/// Maximum number of characters inspected by the content heuristics.
pub const CONTENT_SAMPLE_CHARS: usize = 5000;

const COBOL_EXTENSIONS: &[&str] = &["cob", "cbl", "cobol"];
const COBOL_DIVISIONS: &[&str] =
    &["IDENTIFICATION DIVISION", "PROCEDURE DIVISION", "DATA DIVISION"];
const SHELL_INTERPRETERS: &[&str] = &["sh", "bash", "zsh", "ksh", "dash"];

const COBOL_EXTENSION_CONFIDENCE: f64 = 0.98;
const EXTENSION_CONFIDENCE: f64 = 0.95;
const COBOL_HEURISTIC_CONFIDENCE: f64 = 0.92;
const SHEBANG_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.5;

pub const UNKNOWN_LANGUAGE: &str = "unknown";

fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        "py" => "python",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "java" => "java",
        "kt" => "kotlin",
        "cs" => "csharp",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "sh" => "shell",
        _ => return None,
    };
    Some(lang)
}

/// Lowercased suffix after the last `.` of the final path component.
///
/// Unlike `Path::extension`, a bare dotfile such as `.py` yields `py`.
fn extension_of(path: &str) -> String {
    let name = Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or(path);
    name.rfind('.').map(|i| name[i + 1..].to_ascii_lowercase()).unwrap_or_default()
}

/// Detect the language of `path`, optionally looking at its content.
pub fn detect(path: &str, content: Option<&str>) -> Detection {
    let ext = extension_of(path);

    if COBOL_EXTENSIONS.contains(&ext.as_str()) {
        return Detection::new("cobol", DetectionMethod::Extension, COBOL_EXTENSION_CONFIDENCE);
    }
    if let Some(lang) = language_for_extension(&ext) {
        return Detection::new(lang, DetectionMethod::Extension, EXTENSION_CONFIDENCE);
    }

    if let Some(content) = content {
        let sample: String = content.chars().take(CONTENT_SAMPLE_CHARS).collect();
        let folded = sample.to_uppercase();
        if COBOL_DIVISIONS.iter().any(|k| folded.contains(k)) {
            return Detection::new("cobol", DetectionMethod::Heuristic, COBOL_HEURISTIC_CONFIDENCE);
        }
        if let Some(lang) = shebang_language(&sample) {
            return Detection::new(lang, DetectionMethod::Heuristic, SHEBANG_CONFIDENCE);
        }
    }

    debug!(path, "no extension or content hint matched");
    Detection::new(UNKNOWN_LANGUAGE, DetectionMethod::Mixed, FALLBACK_CONFIDENCE)
}

/// Map a `#!` line to a language. `#!/usr/bin/env python3` and `#!/bin/bash` both work.
fn shebang_language(sample: &str) -> Option<&'static str> {
    let line = sample.lines().next()?.strip_prefix("#!")?;
    let lower = line.to_ascii_lowercase();
    if lower.contains("python") {
        return Some("python");
    }
    let is_shell = lower
        .split_whitespace()
        .filter_map(|part| part.rsplit('/').next())
        .any(|bin| SHELL_INTERPRETERS.contains(&bin));
    is_shell.then_some("shell")
}

use flowdoc_core::detect::{detect, CONTENT_SAMPLE_CHARS, UNKNOWN_LANGUAGE};
use flowdoc_core::model::DetectionMethod;

#[test]
fn extension_table_wins() {
    let d = detect("src/app.py", None);
    assert_eq!(d.language, "python");
    assert_eq!(d.method, DetectionMethod::Extension);
    assert_eq!(d.confidence, 0.95);

    let d = detect("web/index.mjs", None);
    assert_eq!(d.language, "javascript");
}

#[test]
fn bare_dotfile_names_use_their_suffix() {
    let d = detect(".py", None);
    assert_eq!(d.language, "python");
    assert_eq!(d.method, DetectionMethod::Extension);

    assert_eq!(detect("scripts/.SH", None).language, "shell");
    assert_eq!(detect("release.v2/README", None).language, UNKNOWN_LANGUAGE);
}

#[test]
fn cobol_extensions_are_case_insensitive() {
    for path in ["PAYROLL.CBL", "batch/report.cob", "legacy.cobol"] {
        let d = detect(path, None);
        assert_eq!(d.language, "cobol", "{path}");
        assert_eq!(d.method, DetectionMethod::Extension);
        assert_eq!(d.confidence, 0.98);
    }
}

#[test]
fn extension_beats_content_heuristics() {
    let d = detect("main.py", Some("       IDENTIFICATION DIVISION.\n"));
    assert_eq!(d.language, "python");
    assert_eq!(d.method, DetectionMethod::Extension);
}

#[test]
fn cobol_division_keyword_in_content() {
    let d = detect("prog.txt", Some("       identification division.\n       program-id. X.\n"));
    assert_eq!(d.language, "cobol");
    assert_eq!(d.method, DetectionMethod::Heuristic);
    assert_eq!(d.confidence, 0.92);
}

#[test]
fn division_keyword_past_sample_window_is_ignored() {
    let mut content = "x".repeat(CONTENT_SAMPLE_CHARS);
    content.push_str("PROCEDURE DIVISION");
    let d = detect("prog", Some(&content));
    assert_eq!(d.language, UNKNOWN_LANGUAGE);
}

#[test]
fn shebang_interpreters() {
    let d = detect("tool", Some("#!/usr/bin/env python3\nprint('hi')\n"));
    assert_eq!(d.language, "python");
    assert_eq!(d.method, DetectionMethod::Heuristic);
    assert_eq!(d.confidence, 0.8);

    let d = detect("deploy", Some("#!/bin/bash\nset -e\n"));
    assert_eq!(d.language, "shell");

    let d = detect("deploy", Some("#!/usr/bin/env zsh\n"));
    assert_eq!(d.language, "shell");
}

#[test]
fn shebang_must_be_on_first_line() {
    let d = detect("tool", Some("\n#!/bin/bash\n"));
    assert_eq!(d.language, UNKNOWN_LANGUAGE);
}

#[test]
fn unknown_fallback() {
    let d = detect("README", None);
    assert_eq!(d.language, UNKNOWN_LANGUAGE);
    assert_eq!(d.method, DetectionMethod::Mixed);
    assert_eq!(d.confidence, 0.5);

    let d = detect("notes.md", Some("just some prose"));
    assert_eq!(d.language, UNKNOWN_LANGUAGE);
}

#[test]
fn confidence_is_always_in_range() {
    let samples = [
        ("a.go", None),
        ("a.unknownext", Some("#!/bin/sh")),
        ("", Some("")),
        ("x", Some("DATA DIVISION")),
    ];
    for (path, content) in samples {
        let d = detect(path, content);
        assert!((0.0..=1.0).contains(&d.confidence), "{path}: {}", d.confidence);
    }
}

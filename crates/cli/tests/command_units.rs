use std::fs;

use flowdoc::commands::{
    build_document, load_document, write_bundle, write_json, AnalyzeOptions, RunMetadata,
};
use flowdoc::{canonicalize_or_current, diagram_file_name};
use flowdoc_core::diagram::to_bundle;
use flowdoc_core::model::UnitKind;
use tempfile::tempdir;

fn mock_options(root: &std::path::Path, path: &str) -> AnalyzeOptions {
    AnalyzeOptions {
        source: Some("mock".into()),
        ..AnalyzeOptions::new(root.to_string_lossy(), path)
    }
}

#[test]
fn diagram_file_names_are_position_prefixed() {
    assert_eq!(diagram_file_name(0, "u_main"), "01-u_main.mmd");
    assert_eq!(diagram_file_name(11, "u-X"), "12-u-X.mmd");
}

#[test]
fn diagram_file_names_never_escape_the_output_dir() {
    assert_eq!(diagram_file_name(0, "../etc/passwd"), "01-___etc_passwd.mmd");
    assert_eq!(diagram_file_name(2, ""), "03-u_main.mmd");
}

#[test]
fn canonicalize_or_current_joins_missing_paths() {
    let cwd = std::env::current_dir().expect("cwd");
    let resolved = canonicalize_or_current("does/not/exist/yet").expect("resolve");
    assert_eq!(resolved, cwd.join("does/not/exist/yet"));
}

#[test]
fn build_document_uses_requested_source_and_metadata() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("PAY.cbl"), "       PROCEDURE DIVISION.\n       0100-MAIN.\n")
        .expect("write cobol");
    let mut opts = mock_options(temp.path(), "PAY.cbl");
    opts.owner = Some("acme".into());
    opts.repo = Some("ledger".into());

    let (doc, source) = build_document(&opts).expect("build document");
    assert_eq!(source, "mock");
    assert_eq!(doc.language, "cobol");
    assert_eq!(doc.units[0].kind(), UnitKind::Cobol);
    assert_eq!(doc.units[0].name(), "0100-MAIN");
    assert_eq!(doc.file.owner.as_deref(), Some("acme"));
    assert_eq!(doc.file.repo.as_deref(), Some("ledger"));
}

#[test]
fn build_document_rejects_binary_files() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("image.py"), [0xff, 0xd8, 0xff]).expect("write binary");
    let err = build_document(&mock_options(temp.path(), "image.py")).unwrap_err();
    assert!(err.to_string().contains("not text"), "{err}");
}

#[test]
fn write_bundle_and_reload_document() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("a.js"), "function a() {}\n").expect("write js");
    let (doc, _) = build_document(&mock_options(temp.path(), "a.js")).expect("build");

    let doc_path = temp.path().join("nested/dir/analysis.json");
    write_json(&doc_path, &doc).expect("write doc");
    assert_eq!(load_document(&doc_path).expect("load doc"), doc);

    let written = write_bundle(&to_bundle(&doc), &temp.path().join("d")).expect("write bundle");
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("01-u_main.mmd"));
    assert!(temp.path().join("d/diagrams.json").is_file());
}

#[test]
fn write_bundle_flattens_hand_edited_unit_ids() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join("a.js"), "function a() {}\n").expect("write js");
    let (mut doc, _) = build_document(&mock_options(temp.path(), "a.js")).expect("build");
    let mut raw = serde_json::to_value(&doc).expect("to value");
    raw["units"][0]["id"] = serde_json::json!("nested/unit");
    doc = serde_json::from_value(raw).expect("from value");

    let out = temp.path().join("d");
    let written = write_bundle(&to_bundle(&doc), &out).expect("write bundle");
    assert_eq!(written, vec![out.join("01-nested_unit.mmd")]);
    assert!(written[0].is_file());
}

#[test]
fn run_metadata_round_trips() {
    let meta = RunMetadata {
        path: "a.py".into(),
        source: "mock".into(),
        language: "python".into(),
        sha: None,
        unit_count: 1,
        diagram_count: 1,
        notes: String::new(),
        started_at: "2024-01-01T00:00:00+00:00".into(),
        finished_at: "2024-01-01T00:00:01+00:00".into(),
    };
    let json = serde_json::to_string(&meta).expect("serialize");
    let back: RunMetadata = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.finished_at, meta.finished_at);
}

use flowdoc_core::model::{DetectionMethod, DiagramType, Unit, UnitKind};
use flowdoc_core::normalize::normalize;
use flowdoc_core::schema::{validate_document, SchemaValidator};
use flowdoc_core::services::analysis::{
    dominant_diagram_type, sha256_hex, AnalysisRequest, Analyzer, FetchError, FileFetcher,
    LocalFileFetcher,
};
use flowdoc_core::services::sources::{GenerationError, GenerationRequest, MockUnitSource, UnitSource};
use serde_json::{json, Value};
use tempfile::tempdir;

struct TimeoutSource;

impl UnitSource for TimeoutSource {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<Vec<Value>, GenerationError> {
        Err(GenerationError::Timeout(5))
    }
}

/// Returns a fixed payload regardless of input.
struct FixedSource(Vec<Value>);

impl UnitSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<Vec<Value>, GenerationError> {
        Ok(self.0.clone())
    }
}

#[test]
fn mock_analysis_builds_a_valid_document() {
    let source = MockUnitSource;
    let content = "def main():\n    return 1";
    let request = AnalysisRequest::new("src/app.py", content)
        .with_ref(Some("main".into()))
        .with_repo(Some("acme".into()), Some("tools".into()));
    let doc = Analyzer::new(&source).analyze(&request);

    assert_eq!(doc.version, "1.0");
    assert_eq!(doc.language, "python");
    assert_eq!(doc.detector.method, DetectionMethod::Extension);
    assert_eq!(doc.git_ref.as_deref(), Some("main"));
    assert_eq!(doc.file.owner.as_deref(), Some("acme"));
    assert_eq!(doc.file.repo.as_deref(), Some("tools"));
    assert_eq!(doc.file.sha.as_deref(), Some(sha256_hex(content.as_bytes()).as_str()));
    assert_eq!(doc.file.size_bytes, content.len() as u64);
    assert_eq!(doc.summary.unit_count, 1);
    assert_eq!(doc.summary.diagram_suggestion, DiagramType::Flowchart);
    assert!(doc.summary.notes.is_empty());
    assert_eq!(doc.units[0].range().end_line, 2);
    assert!(validate_document(&doc, &SchemaValidator).is_ok());
}

#[test]
fn cobol_files_get_cobol_units() {
    let source = MockUnitSource;
    let doc = Analyzer::new(&source)
        .analyze(&AnalysisRequest::new("PAYROLL.cbl", "       PROCEDURE DIVISION.\n"));
    assert_eq!(doc.language, "cobol");
    assert_eq!(doc.units[0].kind(), UnitKind::Cobol);
}

#[test]
fn generation_failure_becomes_fallback_unit_with_note() {
    let source = TimeoutSource;
    let doc = Analyzer::new(&source).analyze(&AnalysisRequest::new("a.go", "x\ny\nz"));
    assert_eq!(doc.units.len(), 1);
    let unit = &doc.units[0];
    assert_eq!(unit.id(), "u_main");
    assert!(unit.purpose().starts_with("Fallback:"));
    assert_eq!(unit.range().end_line, 3);
    assert!(doc.summary.notes.contains("unit generation failed"));
    assert!(doc.summary.notes.contains("timed out"));
    assert!(validate_document(&doc, &SchemaValidator).is_ok());
}

#[test]
fn dropped_records_are_noted() {
    let source = FixedSource(vec![json!("garbage"), json!({"id": "ok", "steps": ["A"]})]);
    let doc = Analyzer::new(&source).analyze(&AnalysisRequest::new("a.ts", "let a = 1;"));
    assert_eq!(doc.units.len(), 1);
    assert_eq!(doc.units[0].id(), "ok");
    assert_eq!(doc.summary.notes, "1 unit record(s) dropped during normalization");
}

#[test]
fn empty_generation_is_replaced_by_fallback() {
    let source = FixedSource(vec![]);
    let doc = Analyzer::new(&source).analyze(&AnalysisRequest::new("a.ts", ""));
    assert_eq!(doc.units[0].id(), "u_main");
    assert!(doc.summary.notes.contains("fallback unit substituted"));
}

fn generic(record: Value) -> Unit {
    normalize(&[record], UnitKind::Generic).remove(0)
}

#[test]
fn dominant_type_prefers_majority_then_first_seen() {
    let flow = generic(json!({"steps": ["a"]}));
    let seq = generic(json!({
        "logic": {
            "steps": ["a"],
            "calls": [
                {"target": "x", "kind": "api"},
                {"target": "y", "kind": "api"},
                {"target": "z", "kind": "api"}
            ]
        }
    }));
    assert_eq!(dominant_diagram_type(&[flow.clone(), seq.clone()]), DiagramType::Flowchart);
    assert_eq!(dominant_diagram_type(&[seq.clone(), flow.clone()]), DiagramType::Sequence);
    assert_eq!(dominant_diagram_type(&[flow, seq.clone(), seq]), DiagramType::Sequence);
    assert_eq!(dominant_diagram_type(&[]), DiagramType::Flowchart);
}

#[test]
fn local_fetcher_reads_and_hashes() {
    let temp = tempdir().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src/job.sh"), b"#!/bin/sh\necho hi\n").unwrap();

    let fetcher = LocalFileFetcher::new(temp.path());
    let file = fetcher.fetch("src/job.sh", None).unwrap();
    assert!(file.is_text);
    assert_eq!(file.size, 18);
    assert_eq!(file.sha, sha256_hex(b"#!/bin/sh\necho hi\n"));

    let source = MockUnitSource;
    let doc = Analyzer::new(&source).analyze_file(&fetcher, "src/job.sh", Some("v1")).unwrap();
    assert_eq!(doc.language, "shell");
    assert_eq!(doc.file.path, "src/job.sh");
    assert_eq!(doc.file.sha.as_deref(), Some(file.sha.as_str()));
    assert_eq!(doc.git_ref.as_deref(), Some("v1"));
}

#[test]
fn local_fetcher_errors() {
    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
    let fetcher = LocalFileFetcher::new(temp.path());
    let source = MockUnitSource;
    let analyzer = Analyzer::new(&source);

    let err = analyzer.analyze_file(&fetcher, "missing.py", None).unwrap_err();
    assert!(matches!(err, FetchError::NotFound(_)));

    let file = fetcher.fetch("blob.bin", None).unwrap();
    assert!(!file.is_text);
    let err = analyzer.analyze_file(&fetcher, "blob.bin", None).unwrap_err();
    assert!(matches!(err, FetchError::NotText(path) if path == "blob.bin"));
}

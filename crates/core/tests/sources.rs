use flowdoc_core::config::{AnalyzerConfig, ConfigError, LlmConfig};
use flowdoc_core::model::{LineRange, StepKind, Unit, UnitKind};
use flowdoc_core::normalize::normalize;
use flowdoc_core::services::sources::{
    default_source_registry, parse_unit_payload, GenerationError, GenerationRequest,
    HttpUnitSource, MockUnitSource, SourceRegistry, UnitSource,
};

fn request<'a>(code: &'a str, language: &'a str, kind: UnitKind) -> GenerationRequest<'a> {
    GenerationRequest { code, language, path: "src/file", kind }
}

#[test]
fn mock_generic_unit_spans_the_file() {
    let raw = MockUnitSource.generate(&request("a\nb\nc", "python", UnitKind::Generic)).unwrap();
    assert_eq!(raw.len(), 1);
    let units = normalize(&raw, UnitKind::Generic);
    let Unit::Generic(unit) = &units[0] else {
        panic!("expected generic unit");
    };
    assert_eq!(unit.id, "u_main");
    assert_eq!(unit.name, "main");
    assert_eq!(unit.range, LineRange::new(1, 3));
    let kinds: Vec<StepKind> = unit.logic.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Action, StepKind::Action, StepKind::Return]);
}

#[test]
fn mock_empty_code_has_single_line_range() {
    let raw = MockUnitSource.generate(&request("", "python", UnitKind::Generic)).unwrap();
    assert_eq!(normalize(&raw, UnitKind::Generic)[0].range(), LineRange::new(1, 1));
}

#[test]
fn mock_cobol_unit_uses_first_paragraph_label() {
    let code = "       PROCEDURE DIVISION.\n       main-logic.\n           STOP RUN.\n";
    let raw = MockUnitSource.generate(&request(code, "cobol", UnitKind::Cobol)).unwrap();
    let units = normalize(&raw, UnitKind::Cobol);
    let Unit::Cobol(unit) = &units[0] else {
        panic!("expected cobol unit");
    };
    assert_eq!(unit.name, "MAIN-LOGIC");
    assert_eq!(unit.id, "u-MAIN-LOGIC");
    assert_eq!(unit.division.as_deref(), Some("PROCEDURE"));
    let kinds: Vec<StepKind> = unit.logic.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![StepKind::Io, StepKind::Other, StepKind::Io, StepKind::Exit]);
}

#[test]
fn mock_cobol_without_paragraph_uses_default_name() {
    let raw = MockUnitSource.generate(&request("DISPLAY 'HI'", "cobol", UnitKind::Cobol)).unwrap();
    let units = normalize(&raw, UnitKind::Cobol);
    assert_eq!(units[0].name(), "MAIN-PARAGRAPH");
    assert_eq!(units[0].id(), "u-MAIN-PARAGRAPH");
}

#[test]
fn unit_kind_depends_on_source() {
    assert_eq!(MockUnitSource.unit_kind("cobol"), UnitKind::Cobol);
    assert_eq!(MockUnitSource.unit_kind("python"), UnitKind::Generic);
    let http = HttpUnitSource::new(LlmConfig::default());
    assert_eq!(http.unit_kind("cobol"), UnitKind::Generic);
}

#[test]
fn payload_parsing_accepts_fences_arrays_and_objects() {
    let fenced = "```json\n[{\"id\": \"a\"}, {\"id\": \"b\"}]\n```";
    assert_eq!(parse_unit_payload(fenced).unwrap().len(), 2);
    assert_eq!(parse_unit_payload("  {\"id\": \"a\"}  ").unwrap().len(), 1);
    assert_eq!(parse_unit_payload("```\n[]\n```").unwrap().len(), 0);
}

#[test]
fn payload_parsing_rejects_other_shapes() {
    assert!(matches!(parse_unit_payload("42"), Err(GenerationError::MalformedOutput(_))));
    assert!(matches!(
        parse_unit_payload("Sure! Here are the units:"),
        Err(GenerationError::MalformedOutput(_))
    ));
}

#[test]
fn http_source_without_credentials_fails_before_any_request() {
    let config = LlmConfig {
        api_key_env: "FLOWDOC_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
        ..LlmConfig::default()
    };
    let source = HttpUnitSource::new(config);
    let err = source.generate(&request("x = 1", "python", UnitKind::Generic)).unwrap_err();
    match err {
        GenerationError::MissingCredentials(var) => {
            assert_eq!(var, "FLOWDOC_TEST_KEY_THAT_IS_NEVER_SET")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn registry_lists_sorted_names_and_reports_unknown() {
    let registry = default_source_registry(&AnalyzerConfig::default());
    assert_eq!(registry.names(), vec!["http".to_string(), "mock".to_string()]);
    assert!(registry.get("mock").is_some());

    let err = registry.require("llama").err().unwrap();
    assert!(matches!(err, ConfigError::UnknownSource { .. }));
    assert!(err.to_string().contains("Available: http, mock"));
}

#[test]
fn empty_registry_has_no_names() {
    let mut registry = SourceRegistry::new();
    assert!(registry.names().is_empty());
    registry.register(MockUnitSource);
    assert_eq!(registry.names(), vec!["mock".to_string()]);
}

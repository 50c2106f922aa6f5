use clauselens_core::catalogue::{load, CompiledCatalogue};
use clauselens_core::dispatch::reason::Candidate;
use clauselens_core::dsl::ENGINE_VERSION;
use clauselens_core::engine::exec::{execute_candidates, segment_context};
use clauselens_core::error::CoreError;
use clauselens_core::model::doc::Segment;
use clauselens_core::model::features::FeatureSet;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

const TS: &str = "2024-06-01T00:00:00Z";

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn nda_rule() -> Value {
    json!({
        "id": "NDA-001",
        "pack": "confidentiality",
        "severity": "Medium",
        "title": {"en": "NDA marker present", "de": "NDA-Hinweis vorhanden"},
        "message": {"en": "The text refers to an NDA.", "de": "Der Text verweist auf ein NDA."},
        "engine_version": ENGINE_VERSION,
        "checks": [{"when": "context.text contains 'NDA'"}]
    })
}

fn seg(text: &str) -> Segment {
    Segment {
        id: "s1".to_string(),
        start: 0,
        end: text.len(),
        text: text.to_string(),
        heading: None,
        clause_type: None,
        number: None,
        kind: None,
    }
}

fn catalogue_from(rule: &Value) -> CompiledCatalogue {
    let tmp = tempfile::tempdir().unwrap();
    write_json(&tmp.path().join("uk_core/nda.dsl.json"), rule);
    load(&[tmp.path().to_path_buf()])
}

fn run(catalogue: &CompiledCatalogue, text: &str) -> Result<Vec<clauselens_core::model::finding::Finding>, CoreError> {
    let segment = seg(text);
    let context = segment_context(&segment, &FeatureSet::default());
    let candidates = vec![Candidate {
        rule_id: "NDA-001".to_string(),
        reasons: Vec::new(),
    }];
    execute_candidates(catalogue, &candidates, &segment, &context, TS)
}

#[test]
fn file_loaded_check_fires_only_on_matching_text() {
    let catalogue = catalogue_from(&nda_rule());
    assert_eq!(catalogue.rules.len(), 1);

    let findings = run(&catalogue, "NDA draft").unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_id, "NDA-001");
    assert_eq!(findings[0].engine_version, ENGINE_VERSION);

    let findings = run(&catalogue, "draft").unwrap();
    assert!(findings.is_empty());
}

#[test]
fn locale_lookup_falls_back_to_base() {
    let catalogue = catalogue_from(&nda_rule());
    let findings = run(&catalogue, "NDA draft").unwrap();
    assert_eq!(
        findings[0].message_for("de"),
        Some("Der Text verweist auf ein NDA.")
    );
    assert_eq!(
        findings[0].message_for("fr"),
        Some("The text refers to an NDA.")
    );
}

#[test]
fn stale_engine_version_fails_execution() {
    let mut rule = nda_rule();
    rule["engine_version"] = json!("1.9.0");
    let catalogue = catalogue_from(&rule);
    let err = run(&catalogue, "NDA draft").unwrap_err();
    assert!(matches!(err, CoreError::EngineVersionMismatch(_)));
}

#[test]
fn missing_engine_version_fails_execution() {
    let mut rule = nda_rule();
    rule.as_object_mut().unwrap().remove("engine_version");
    let catalogue = catalogue_from(&rule);
    let err = run(&catalogue, "NDA draft").unwrap_err();
    assert!(matches!(err, CoreError::EngineVersionMismatch(_)));
}

#[test]
fn unsupported_expression_syntax_is_a_hard_error() {
    let mut rule = nda_rule();
    rule["checks"] = json!([
        {"when": "context.text contains 'NDA'"},
        {"when": "context.a and context.b"}
    ]);
    let catalogue = catalogue_from(&rule);
    let err = run(&catalogue, "NDA draft").unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedExpr(_)));
}

#[test]
fn rule_with_checks_but_no_base_locale_is_skipped_at_load() {
    let mut rule = nda_rule();
    rule["title"] = json!({"de": "nur deutsch"});
    let catalogue = catalogue_from(&rule);
    assert!(catalogue.rules.is_empty());
    assert_eq!(catalogue.skipped.len(), 1);
}

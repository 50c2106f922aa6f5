use clauselens_core::catalogue::{load, CompiledCatalogue};
use clauselens_core::determinism::hashing::{sha256_hex, trace_id_from_fingerprint_hex32};
use clauselens_core::determinism::json_canonical::to_canonical_bytes;
use clauselens_core::dispatch::reason::{Candidate, ReasonPayload};
use clauselens_core::dispatch::select::select_candidates;
use clauselens_core::dispatch::DispatchCaps;
use clauselens_core::dsl::ENGINE_VERSION;
use clauselens_core::graph::checks;
use clauselens_core::graph::extract::build_param_graph;
use clauselens_core::model::doc::Segment;
use clauselens_core::model::features::{DocFeatures, DraftProposal, DurationEntity, FeatureSet};
use clauselens_core::trace::artifact;
use clauselens_core::trace::caps::TraceCaps;
use clauselens_core::trace::redact::find_forbidden_key;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TS: &str = "2026-02-10T09:00:00Z";

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn fixture_catalogue() -> (TempDir, CompiledCatalogue) {
    let tmp = tempfile::tempdir().unwrap();
    let pack = tmp.path().join("uk_core");
    write_json(
        &pack.join("payment_term.patterns.json"),
        &json!({
            "id": "PAY-001",
            "clause_type": "payment",
            "severity": "High",
            "patterns": ["(?i)within\\s+\\d+\\s+days"],
            "advice": "payment term must not exceed the agreed period"
        }),
    );
    write_json(
        &pack.join("nda.dsl.json"),
        &json!({
            "id": "NDA-001",
            "severity": "Medium",
            "category": "confidentiality",
            "title": {"en": "NDA marker"},
            "message": {"en": "NDA reference found"},
            "engine_version": ENGINE_VERSION,
            "checks": [{"when": "context.text contains 'confidential'"}]
        }),
    );
    let catalogue = load(&[tmp.path().to_path_buf()]);
    (tmp, catalogue)
}

fn fixture_segments() -> Vec<Segment> {
    let s1 = "Invoices are payable within 60 days of the invoice date.";
    let s2 = "This Agreement is governed by the laws of England and Wales. \
              The courts of France have exclusive jurisdiction.";
    vec![
        Segment {
            id: "s1".to_string(),
            start: 0,
            end: s1.len(),
            text: s1.to_string(),
            heading: Some("Payment".to_string()),
            clause_type: Some("payment".to_string()),
            number: Some("1".to_string()),
            kind: None,
        },
        Segment {
            id: "s2".to_string(),
            start: 200,
            end: 200 + s2.len(),
            text: s2.to_string(),
            heading: None,
            clause_type: Some("governing_law".to_string()),
            number: Some("2".to_string()),
            kind: None,
        },
    ]
}

fn fixture_features() -> Vec<FeatureSet> {
    let mut f1 = FeatureSet::default();
    f1.segment_id = "s1".to_string();
    f1.labels = vec!["payment".to_string()];
    f1.durations = vec![DurationEntity {
        unit: "days".to_string(),
        value: 60,
        start: 28,
        end: 35,
    }];
    let mut f2 = FeatureSet::default();
    f2.segment_id = "s2".to_string();
    f2.labels = vec!["governing_law".to_string(), "jurisdiction".to_string()];
    vec![f1, f2]
}

fn assemble_from_pipeline() -> Value {
    let (_tmp, catalogue) = fixture_catalogue();
    let segments = fixture_segments();
    let features = fixture_features();
    let dispatch_caps = DispatchCaps::default();

    let per_segment: Vec<(String, Vec<Candidate>)> = segments
        .iter()
        .zip(features.iter())
        .map(|(segment, fs)| {
            (
                segment.id.clone(),
                select_candidates(segment, fs, &catalogue, &dispatch_caps),
            )
        })
        .collect();

    let graph = build_param_graph(&DocFeatures::default(), &segments);
    let findings = checks::evaluate(&graph, TS);
    assert!(
        findings.iter().any(|f| f.rule_id == "L2::L2-010"),
        "fixture should trip the jurisdiction check"
    );

    let proposal = DraftProposal {
        rule_id: "PAY-001".to_string(),
        segment_id: "s1".to_string(),
        kind: "redline".to_string(),
        text: "Invoices are payable within 30 days.".to_string(),
        locale: "en".to_string(),
    };

    let fingerprint = sha256_hex(&to_canonical_bytes(&(&segments, &features)).unwrap());
    let trace_id = trace_id_from_fingerprint_hex32(&fingerprint).unwrap();
    let caps = TraceCaps::default();
    artifact::assemble(
        &trace_id,
        TS,
        artifact::build_features(&features, &caps),
        artifact::build_dispatch(&per_segment, &caps),
        artifact::build_constraints(&graph, &findings, &caps),
        artifact::build_proposals(&[proposal], &caps),
    )
}

#[test]
fn pipeline_trace_carries_no_document_text() {
    let artifact = assemble_from_pipeline();
    assert_eq!(find_forbidden_key(&artifact), None);

    let serialized = serde_json::to_string(&artifact).unwrap();
    assert!(!serialized.contains("payable"), "document text leaked");
    assert!(
        !serialized.contains("England and Wales"),
        "extracted free text leaked"
    );
    assert!(
        !serialized.contains("Invoices are payable within 30 days"),
        "proposal text leaked"
    );
}

#[test]
fn free_text_fields_become_hash_and_length() {
    let artifact = assemble_from_pipeline();

    let law = &artifact["constraints"]["graph"]["governing_law"];
    assert_eq!(law["len"], json!("England and Wales".chars().count()));
    assert_eq!(law["hash"].as_str().unwrap().len(), 8);

    let evidence = artifact["constraints"]["findings"][0]["evidence"]
        .as_array()
        .unwrap();
    for item in evidence {
        let obj = item.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("hash") && obj.contains_key("len"));
    }

    let content = &artifact["proposals"]["proposals"][0]["content"];
    assert!(content["hash"].is_string());
    assert_eq!(content["len"], json!(36));
}

#[test]
fn structural_values_stay_verbatim() {
    let artifact = assemble_from_pipeline();
    let graph = &artifact["constraints"]["graph"];
    assert!(graph["clause_numbers"]
        .as_array()
        .unwrap()
        .contains(&json!("1")));
    assert_eq!(graph["parties"], json!(0));
    assert_eq!(
        graph["sources"]["governing_law"]["clause_id"],
        json!("s2"),
        "provenance keeps the clause id"
    );
    assert!(graph["sources"]["governing_law"]["span"].is_array());
}

#[test]
fn every_section_list_is_bounded_by_its_cap() {
    let caps = TraceCaps::default();

    let mut fs = FeatureSet::default();
    fs.segment_id = "s1".to_string();
    fs.labels = (0..40).map(|i| format!("label{i:02}")).collect();
    fs.durations = (0..30)
        .map(|i| DurationEntity {
            unit: "days".to_string(),
            value: i,
            start: i as usize,
            end: i as usize + 2,
        })
        .collect();
    let features = artifact::build_features(&[fs], &caps);
    let segment = &features["segments"][0];
    assert_eq!(segment["labels"].as_array().unwrap().len(), caps.max_labels);
    assert_eq!(
        segment["durations"].as_array().unwrap().len(),
        caps.max_entities
    );

    let candidates: Vec<Candidate> = (0..60)
        .map(|i| Candidate {
            rule_id: format!("R-{i:03}"),
            reasons: (0..20).map(|_| ReasonPayload::default()).collect(),
        })
        .collect();
    let dispatch = artifact::build_dispatch(&[("s1".to_string(), candidates)], &caps);
    let listed = dispatch["segments"][0]["candidates"].as_array().unwrap();
    assert_eq!(listed.len(), caps.max_candidates);
    assert_eq!(
        listed[0]["reasons"].as_array().unwrap().len(),
        caps.max_reasons
    );

    let proposals: Vec<DraftProposal> = (0..60)
        .map(|i| DraftProposal {
            rule_id: format!("R-{i:03}"),
            segment_id: "s1".to_string(),
            kind: "redline".to_string(),
            text: "replacement wording".to_string(),
            locale: "en".to_string(),
        })
        .collect();
    let built = artifact::build_proposals(&proposals, &caps);
    assert_eq!(
        built["proposals"].as_array().unwrap().len(),
        caps.max_candidates
    );
}

use clauselens_core::catalogue::{load, CompiledCatalogue};
use clauselens_core::determinism::hashing::{sha256_hex, trace_id_from_fingerprint_hex32};
use clauselens_core::determinism::json_canonical::to_canonical_bytes;
use clauselens_core::dispatch::reason::Candidate;
use clauselens_core::dispatch::select::select_candidates;
use clauselens_core::dispatch::DispatchCaps;
use clauselens_core::dsl::ENGINE_VERSION;
use clauselens_core::engine::exec::{execute_candidates, segment_context};
use clauselens_core::graph::checks;
use clauselens_core::graph::extract::build_param_graph;
use clauselens_core::graph::param_graph::ParamGraph;
use clauselens_core::model::doc::Segment;
use clauselens_core::model::features::{DocFeatures, DurationEntity, FeatureSet};
use clauselens_core::model::finding::Finding;
use clauselens_core::model::now_rfc3339_utc;
use clauselens_core::trace::artifact;
use clauselens_core::trace::caps::TraceCaps;
use clauselens_core::trace::redact::find_forbidden_key;
use serde_json::{json, Value};
use std::path::Path;

fn main() {
    // audit_runner drives the whole analysis path against a self-contained
    // fixture catalogue and document, twice, and checks:
    // 1) every pipeline stage produces what the fixture demands
    // 2) the two runs are byte-identical under canonical JSON
    // 3) the trace artifact carries no document text
    //
    // It prints one STAGE line per check and exits non-zero on any FAIL.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let ts_utc = now_rfc3339_utc();
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("rules");
    write_fixture_rules(&root);

    let catalogue = load(&[root]);
    let mut failed = false;
    stage(
        "catalogue_load",
        catalogue.rules.len() == 2 && catalogue.skipped.is_empty(),
        &mut failed,
    );

    let first = run_pipeline(&catalogue, &ts_utc);
    let second = run_pipeline(&catalogue, &ts_utc);

    let payment_candidates = &first.per_segment[0].1;
    let payment_selected = payment_candidates.iter().any(|c| c.rule_id == "PAY-001");
    let duration_reason = payment_candidates
        .iter()
        .filter(|c| c.rule_id == "PAY-001")
        .flat_map(|c| c.reasons.iter())
        .any(|r| r.durations.iter().any(|d| d.unit == "days" && d.value == 60));
    stage("dispatch", payment_selected && duration_reason, &mut failed);

    let pattern_fired = first.findings.iter().any(|f| f.rule_id == "PAY-001");
    let dsl_fired = first.findings.iter().any(|f| f.rule_id == "NDA-001");
    stage("execution", pattern_fired && dsl_fired, &mut failed);

    let law_mismatch = first
        .constraint_findings
        .iter()
        .any(|f| f.rule_id == "L2::L2-010");
    stage("constraint_battery", law_mismatch, &mut failed);

    let first_bytes = to_canonical_bytes(&snapshot(&first)).expect("canonical first run");
    let second_bytes = to_canonical_bytes(&snapshot(&second)).expect("canonical second run");
    stage("determinism", first_bytes == second_bytes, &mut failed);

    stage(
        "trace_no_text",
        find_forbidden_key(&first.trace).is_none(),
        &mut failed,
    );

    if failed {
        println!("AUDIT_RUNNER overall=FAIL");
        std::process::exit(1);
    }
    println!(
        "AUDIT_RUNNER overall=PASS sha256={}",
        sha256_hex(&first_bytes)
    );
}

fn stage(name: &str, ok: bool, failed: &mut bool) {
    println!("STAGE {name} {}", if ok { "PASS" } else { "FAIL" });
    if !ok {
        *failed = true;
    }
}

struct AuditRun {
    per_segment: Vec<(String, Vec<Candidate>)>,
    findings: Vec<Finding>,
    graph: ParamGraph,
    constraint_findings: Vec<Finding>,
    trace: Value,
}

fn snapshot(run: &AuditRun) -> Value {
    json!({
        "dispatch": run.per_segment,
        "findings": run.findings,
        "graph": run.graph,
        "constraints": run.constraint_findings,
        "trace": run.trace,
    })
}

fn run_pipeline(catalogue: &CompiledCatalogue, ts_utc: &str) -> AuditRun {
    let segments = fixture_segments();
    let features = fixture_features();
    let dispatch_caps = DispatchCaps::default();
    let trace_caps = TraceCaps::default();

    let mut per_segment = Vec::new();
    let mut findings = Vec::new();
    for (segment, feature_set) in segments.iter().zip(&features) {
        let candidates = select_candidates(segment, feature_set, catalogue, &dispatch_caps);
        let context = segment_context(segment, feature_set);
        match execute_candidates(catalogue, &candidates, segment, &context, ts_utc) {
            Ok(batch) => findings.extend(batch),
            Err(e) => {
                eprintln!("execution error: {e}");
                std::process::exit(1);
            }
        }
        per_segment.push((segment.id.clone(), candidates));
    }

    let graph = build_param_graph(&DocFeatures::default(), &segments);
    let constraint_findings = checks::evaluate(&graph, ts_utc);

    let fingerprint = sha256_hex(
        &to_canonical_bytes(&(&segments, &features)).expect("canonical fixture input"),
    );
    let trace_id = trace_id_from_fingerprint_hex32(&fingerprint).expect("trace id");
    let trace = artifact::assemble(
        &trace_id,
        ts_utc,
        artifact::build_features(&features, &trace_caps),
        artifact::build_dispatch(&per_segment, &trace_caps),
        artifact::build_constraints(&graph, &constraint_findings, &trace_caps),
        artifact::build_proposals(&[], &trace_caps),
    );

    AuditRun {
        per_segment,
        findings,
        graph,
        constraint_findings,
        trace,
    }
}

fn write_fixture_rules(root: &Path) {
    let pack = root.join("uk_core");
    std::fs::create_dir_all(&pack).expect("create pack dir");

    let pattern = json!({
        "id": "PAY-001",
        "clause_type": "payment",
        "severity": "High",
        "patterns": ["(?i)within\\s+\\d+\\s+days"],
        "advice": "payment term must not exceed the agreed period"
    });
    std::fs::write(
        pack.join("payment.patterns.json"),
        serde_json::to_vec_pretty(&pattern).expect("encode pattern rule"),
    )
    .expect("write pattern rule");

    let dsl = json!({
        "id": "NDA-001",
        "pack": "uk_core",
        "severity": "Medium",
        "category": "confidentiality",
        "title": {"en": "Confidentiality marker"},
        "message": {"en": "The clause refers to confidential information."},
        "engine_version": ENGINE_VERSION,
        "checks": [{"when": "context.text contains 'confidential'"}]
    });
    std::fs::write(
        pack.join("confidentiality.dsl.json"),
        serde_json::to_vec_pretty(&dsl).expect("encode dsl rule"),
    )
    .expect("write dsl rule");
}

fn fixture_segments() -> Vec<Segment> {
    let s1 = "Invoices are payable within 60 days of the invoice date.";
    let s2 = "This agreement is governed by the laws of England and Wales. \
              The courts of France have exclusive jurisdiction.";
    let s3 = "All confidential information shall remain confidential after expiry.";
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
            heading: Some("Governing Law".to_string()),
            clause_type: Some("governing_law".to_string()),
            number: Some("2".to_string()),
            kind: None,
        },
        Segment {
            id: "s3".to_string(),
            start: 400,
            end: 400 + s3.len(),
            text: s3.to_string(),
            heading: Some("Confidentiality".to_string()),
            clause_type: Some("confidentiality".to_string()),
            number: Some("3".to_string()),
            kind: None,
        },
    ]
}

fn fixture_features() -> Vec<FeatureSet> {
    let mut payment = FeatureSet::default();
    payment.segment_id = "s1".to_string();
    payment.labels = vec!["payment".to_string()];
    payment.durations = vec![DurationEntity {
        unit: "days".to_string(),
        value: 60,
        start: 28,
        end: 35,
    }];

    let mut law = FeatureSet::default();
    law.segment_id = "s2".to_string();
    law.labels = vec!["governing_law".to_string(), "jurisdiction".to_string()];

    let mut confidentiality = FeatureSet::default();
    confidentiality.segment_id = "s3".to_string();
    confidentiality.labels = vec!["confidentiality".to_string()];

    vec![payment, law, confidentiality]
}

use clauselens_core::determinism::json_canonical::to_canonical_bytes;
use clauselens_core::graph::checks;
use clauselens_core::graph::extract::build_param_graph;
use clauselens_core::graph::param_graph::{Money, ParamGraph};
use clauselens_core::model::doc::Segment;
use clauselens_core::model::features::DocFeatures;
use clauselens_core::model::finding::FindingSeverity;

const TS: &str = "2026-02-10T09:00:00Z";

fn seg(id: &str, number: &str, start: usize, text: &str) -> Segment {
    Segment {
        id: id.to_string(),
        start,
        end: start + text.len(),
        text: text.to_string(),
        heading: None,
        clause_type: None,
        number: Some(number.to_string()),
        kind: None,
    }
}

#[test]
fn conflicting_jurisdiction_is_flagged() {
    let graph = ParamGraph {
        governing_law: Some("England and Wales".to_string()),
        jurisdiction: Some("Courts of France".to_string()),
        ..ParamGraph::default()
    };
    let findings = checks::evaluate(&graph, TS);
    let hit = findings
        .iter()
        .find(|f| f.rule_id == "L2::L2-010")
        .expect("jurisdiction conflict finding");
    assert_eq!(hit.severity, FindingSeverity::High);
    assert_eq!(hit.engine_version, clauselens_core::dsl::ENGINE_VERSION);
    assert_eq!(hit.created_at, TS);
}

#[test]
fn agreed_jurisdiction_stays_silent() {
    let graph = ParamGraph {
        governing_law: Some("England and Wales".to_string()),
        jurisdiction: Some("Courts of England and Wales".to_string()),
        ..ParamGraph::default()
    };
    assert!(checks::evaluate(&graph, TS).is_empty());
}

#[test]
fn cap_currency_against_contract_currency() {
    let mismatched = ParamGraph {
        cap: Some(Money {
            amount: 1000.0,
            currency: "USD".to_string(),
        }),
        contract_currency: Some("GBP".to_string()),
        ..ParamGraph::default()
    };
    let findings = checks::evaluate(&mismatched, TS);
    assert!(findings.iter().any(|f| f.rule_id == "L2::L2-020"));

    let aligned = ParamGraph {
        cap: Some(Money {
            amount: 1000.0,
            currency: "GBP".to_string(),
        }),
        contract_currency: Some("GBP".to_string()),
        ..ParamGraph::default()
    };
    assert!(checks::evaluate(&aligned, TS).is_empty());
}

#[test]
fn payment_term_beyond_contract_term_end_to_end() {
    let segments = vec![
        seg(
            "s1",
            "1",
            0,
            "Invoices are payable within 120 days of the invoice date.",
        ),
        seg(
            "s2",
            "2",
            200,
            "The initial term of this Agreement shall be 3 months.",
        ),
    ];
    let graph = build_param_graph(&DocFeatures::default(), &segments);
    assert_eq!(graph.payment_term.map(|d| d.days), Some(120));
    assert_eq!(graph.contract_term.map(|d| d.days), Some(90));

    let findings = checks::evaluate(&graph, TS);
    assert_eq!(findings.len(), 1, "{findings:?}");
    assert_eq!(findings[0].rule_id, "L2::L2-001");
    assert_eq!(findings[0].severity, FindingSeverity::High);
}

#[test]
fn segment_order_never_changes_the_battery_output() {
    let s1 = seg(
        "s1",
        "1",
        0,
        "This Agreement is governed by the laws of England and Wales.",
    );
    let s2 = seg(
        "s2",
        "2",
        200,
        "The courts of France shall have exclusive jurisdiction over any dispute.",
    );
    let s3 = seg("s3", "3", 400, "Invoices are payable within 30 days.");
    let s4 = seg(
        "s4",
        "4",
        600,
        "Either party may terminate on 60 days' written notice.",
    );

    let document_order = vec![s1.clone(), s2.clone(), s3.clone(), s4.clone()];
    let shuffled = vec![s3, s1, s4, s2];

    let doc = DocFeatures::default();
    let first = build_param_graph(&doc, &document_order);
    let second = build_param_graph(&doc, &shuffled);
    assert_eq!(
        to_canonical_bytes(&first).unwrap(),
        to_canonical_bytes(&second).unwrap()
    );

    let findings_first = checks::evaluate(&first, TS);
    let findings_second = checks::evaluate(&second, TS);
    assert!(findings_first.iter().any(|f| f.rule_id == "L2::L2-010"));
    assert_eq!(
        to_canonical_bytes(&findings_first).unwrap(),
        to_canonical_bytes(&findings_second).unwrap()
    );
}

//! Trace artifact builders.
//!
//! Every builder is total: malformed or missing input degrades to an empty
//! or null value, never an error. Document text never enters an artifact;
//! free-text values are reduced to an 8-hex content hash plus character
//! length, and match positions to offset pairs.

use crate::determinism::hashing::short_hash8;
use crate::dispatch::reason::{Candidate, ReasonPayload};
use crate::dsl::ENGINE_VERSION;
use crate::graph::param_graph::{DurationValue, ParamGraph};
use crate::model::features::{DraftProposal, FeatureSet};
use crate::model::finding::Finding;
use crate::trace::caps::TraceCaps;
use serde_json::{json, Value};

fn hashed(s: &str) -> Value {
    json!({"hash": short_hash8(s.as_bytes()), "len": s.chars().count()})
}

fn option_hashed(s: &Option<String>) -> Value {
    match s {
        Some(s) => hashed(s),
        None => Value::Null,
    }
}

fn duration(d: Option<DurationValue>) -> Value {
    match d {
        Some(d) => json!({"days": d.days, "kind": d.kind}),
        None => Value::Null,
    }
}

/// Per-segment feature summary.
pub fn build_features(features: &[FeatureSet], caps: &TraceCaps) -> Value {
    let segments: Vec<Value> = features
        .iter()
        .map(|fs| {
            let mut labels: Vec<&str> = fs.labels.iter().map(String::as_str).collect();
            labels.sort_unstable();
            labels.dedup();
            labels.truncate(caps.max_labels);
            let entities: serde_json::Map<String, Value> = fs
                .entities
                .iter()
                .map(|(kind, spans)| {
                    let spans: Vec<Value> = spans
                        .iter()
                        .take(caps.max_entities)
                        .map(|e| json!({"label": e.label, "start": e.start, "end": e.end}))
                        .collect();
                    (kind.clone(), Value::Array(spans))
                })
                .collect();
            json!({
                "segment_id": fs.segment_id,
                "labels": labels,
                "amounts": fs.amounts.iter().take(caps.max_entities).map(|a| {
                    json!({"currency": a.currency, "value": a.value, "start": a.start, "end": a.end})
                }).collect::<Vec<_>>(),
                "durations": fs.durations.iter().take(caps.max_entities).map(|d| {
                    json!({"unit": d.unit, "value": d.value, "start": d.start, "end": d.end})
                }).collect::<Vec<_>>(),
                "law_signals": fs.law_signals.iter().take(caps.max_entities).map(|s| {
                    json!({"code": s.code, "start": s.start, "end": s.end})
                }).collect::<Vec<_>>(),
                "jurisdiction_signals": fs.jurisdiction_signals.iter().take(caps.max_entities).map(|s| {
                    json!({"code": s.code, "start": s.start, "end": s.end})
                }).collect::<Vec<_>>(),
                "entities": entities,
            })
        })
        .collect();
    json!({"segments": segments})
}

fn reason(reason: &ReasonPayload, caps: &TraceCaps) -> Value {
    json!({
        "labels": reason.labels.iter().take(caps.max_labels).collect::<Vec<_>>(),
        "patterns": reason.patterns.iter().take(caps.max_offsets).map(|p| {
            json!({"kind": p.kind, "start": p.start, "end": p.end})
        }).collect::<Vec<_>>(),
        "gates": reason.gates,
        "amounts": reason.amounts.iter().take(caps.max_offsets).map(|a| {
            json!({"currency": a.currency, "value": a.value, "start": a.start, "end": a.end})
        }).collect::<Vec<_>>(),
        "durations": reason.durations.iter().take(caps.max_offsets).map(|d| {
            json!({"unit": d.unit, "value": d.value, "start": d.start, "end": d.end})
        }).collect::<Vec<_>>(),
        "law": reason.law.iter().take(caps.max_offsets).map(|c| {
            json!({"code": c.code, "start": c.start, "end": c.end})
        }).collect::<Vec<_>>(),
        "jurisdiction": reason.jurisdiction.iter().take(caps.max_offsets).map(|c| {
            json!({"code": c.code, "start": c.start, "end": c.end})
        }).collect::<Vec<_>>(),
    })
}

/// Per-segment candidate lists with their reasons.
pub fn build_dispatch(per_segment: &[(String, Vec<Candidate>)], caps: &TraceCaps) -> Value {
    let segments: Vec<Value> = per_segment
        .iter()
        .map(|(segment_id, candidates)| {
            json!({
                "segment_id": segment_id,
                "candidates": candidates.iter().take(caps.max_candidates).map(|c| {
                    json!({
                        "rule_id": c.rule_id,
                        "reasons": c.reasons.iter().take(caps.max_reasons)
                            .map(|r| reason(r, caps)).collect::<Vec<_>>(),
                    })
                }).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({"segments": segments})
}

/// Parameter graph summary plus the constraint findings.
pub fn build_constraints(graph: &ParamGraph, findings: &[Finding], caps: &TraceCaps) -> Value {
    let sources: serde_json::Map<String, Value> = graph
        .sources
        .iter()
        .map(|(field, src)| {
            (
                field.clone(),
                json!({"clause_id": src.clause_id, "span": src.span}),
            )
        })
        .collect();
    json!({
        "graph": {
            "payment_term": duration(graph.payment_term),
            "contract_term": duration(graph.contract_term),
            "grace_period": duration(graph.grace_period),
            "notice_period": duration(graph.notice_period),
            "cure_period": duration(graph.cure_period),
            "governing_law": option_hashed(&graph.governing_law),
            "jurisdiction": option_hashed(&graph.jurisdiction),
            "cap": graph.cap.as_ref()
                .map(|m| json!({"amount": m.amount, "currency": m.currency}))
                .unwrap_or(Value::Null),
            "contract_currency": graph.contract_currency,
            "survival_items": graph.survival_items,
            "cross_refs": graph.cross_refs,
            "clause_numbers": graph.clause_numbers,
            "parties": graph.parties.len(),
            "signatures": graph.signatures.len(),
            "annex_refs": graph.annex_refs,
            "order_of_precedence": graph.order_of_precedence,
            "undefined_terms": graph.undefined_terms.iter()
                .take(caps.max_entities).map(|t| hashed(t)).collect::<Vec<_>>(),
            "numbering_gaps": graph.numbering_gaps,
            "doc_flags": graph.doc_flags,
            "sources": sources,
        },
        "findings": findings.iter().map(|f| {
            json!({
                "rule_id": f.rule_id,
                "severity": f.severity,
                "version": f.version,
                "engine_version": f.engine_version,
                "created_at": f.created_at,
                "flags": f.flags,
                "evidence": f.evidence.iter().take(caps.max_reasons)
                    .map(|e| hashed(e)).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    })
}

/// Drafting proposals with their text reduced to hash plus length.
pub fn build_proposals(proposals: &[DraftProposal], caps: &TraceCaps) -> Value {
    let items: Vec<Value> = proposals
        .iter()
        .take(caps.max_candidates)
        .map(|p| {
            json!({
                "rule_id": p.rule_id,
                "segment_id": p.segment_id,
                "kind": p.kind,
                "locale": p.locale,
                "content": hashed(&p.text),
            })
        })
        .collect();
    json!({"proposals": items})
}

/// Stitch the section artifacts into one trace document.
pub fn assemble(
    trace_id: &str,
    ts_utc: &str,
    features: Value,
    dispatch: Value,
    constraints: Value,
    proposals: Value,
) -> Value {
    json!({
        "trace_id": trace_id,
        "engine_version": ENGINE_VERSION,
        "created_at": ts_utc,
        "features": features,
        "dispatch": dispatch,
        "constraints": constraints,
        "proposals": proposals,
    })
}

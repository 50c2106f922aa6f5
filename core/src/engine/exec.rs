//! Candidate execution: resolve each candidate against the catalogue and
//! run it under its format's convention.

use crate::catalogue::rule::Rule;
use crate::catalogue::source::RuleFormat;
use crate::catalogue::CompiledCatalogue;
use crate::dispatch::reason::Candidate;
use crate::dsl::eval::evaluate_rule;
use crate::dsl::ENGINE_VERSION;
use crate::engine::legacy;
use crate::error::{CoreError, CoreResult};
use crate::model::doc::Segment;
use crate::model::features::FeatureSet;
use crate::model::finding::Finding;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::warn;

/// The evaluation context a segment presents to DSL checks.
pub fn segment_context(segment: &Segment, features: &FeatureSet) -> Value {
    let mut labels: BTreeSet<String> = features.labels.iter().cloned().collect();
    if let Some(ct) = &segment.clause_type {
        labels.insert(ct.clone());
    }
    json!({
        "text": segment.text,
        "heading": segment.heading.clone().unwrap_or_default(),
        "labels": labels.into_iter().collect::<Vec<_>>(),
        "meta": {
            "id": segment.id,
            "kind": segment.kind.clone().unwrap_or_default(),
            "number": segment.number.clone().unwrap_or_default(),
        }
    })
}

/// Execute the dispatcher's candidates in order.
///
/// Interpreter grammar and engine-version errors propagate; bridge failures
/// degrade to a synthetic "System" finding and the batch continues.
pub fn execute_candidates(
    catalogue: &CompiledCatalogue,
    candidates: &[Candidate],
    segment: &Segment,
    context: &Value,
    ts_utc: &str,
) -> CoreResult<Vec<Finding>> {
    let mut findings = Vec::new();
    for candidate in candidates {
        let rule = match catalogue.rules.get(&candidate.rule_id) {
            Some(rule) => rule,
            None => {
                warn!(rule_id = %candidate.rule_id, "candidate references a rule missing from the catalogue");
                continue;
            }
        };
        match rule.format {
            RuleFormat::Pattern => {
                findings.extend(bridge(rule, segment, ts_utc));
            }
            RuleFormat::Dsl => {
                let dsl = rule.dsl.as_ref().ok_or_else(|| {
                    CoreError::InvalidInput(format!("DSL rule {} lost its rule body", rule.id))
                })?;
                findings.extend(evaluate_rule(dsl, context, ts_utc)?);
            }
            RuleFormat::Hybrid => {
                // DSL metadata is primary; a delegate-only hybrid has no
                // checks to interpret and goes straight to the bridge.
                if let Some(dsl) = &rule.dsl {
                    if !dsl.checks.is_empty() {
                        findings.extend(evaluate_rule(dsl, context, ts_utc)?);
                    }
                }
                findings.extend(bridge(rule, segment, ts_utc));
            }
        }
    }
    Ok(findings)
}

/// The single site converting an [`legacy::AdapterError`] into the
/// synthetic "System" finding.
fn bridge(rule: &Rule, segment: &Segment, ts_utc: &str) -> Vec<Finding> {
    match legacy::execute(rule, segment) {
        Ok(batch) => batch
            .iter()
            .map(|l| Finding::from_legacy(l, ENGINE_VERSION, ts_utc))
            .collect(),
        Err(err) => {
            warn!(rule_id = %err.rule_id, detail = %err.detail, "legacy bridge failed");
            vec![Finding::system(&err.to_string(), ENGINE_VERSION, ts_utc)]
        }
    }
}

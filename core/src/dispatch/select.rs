use crate::catalogue::index::{normalize_label, tokenize};
use crate::catalogue::CompiledCatalogue;
use crate::dispatch::reason::{
    AmountEvidence, Candidate, CodeEvidence, DurationEvidence, PatternEvidence, PatternKind,
    ReasonPayload,
};
use crate::dispatch::tables;
use crate::dispatch::DispatchCaps;
use crate::model::doc::Segment;
use crate::model::features::FeatureSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Narrow the catalogue to the rules plausibly relevant to one segment.
///
/// Reasons merge per rule by canonical identity, output is sorted by rule
/// id, and caps truncate after ordering. For a fixed catalogue and input
/// the result is byte-stable, including across permuted label sets.
pub fn select_candidates(
    segment: &Segment,
    features: &FeatureSet,
    catalogue: &CompiledCatalogue,
    caps: &DispatchCaps,
) -> Vec<Candidate> {
    let labels = normalized_labels(segment, features);
    let text_lower = segment.text.to_ascii_lowercase();

    let mut merged: BTreeMap<String, BTreeSet<ReasonPayload>> = BTreeMap::new();

    // Label expansion through the two static tables.
    for label in &labels {
        for clause_type in tables::clause_types_for_label(label) {
            for rule_id in catalogue.index.rules_for_clause_type(clause_type) {
                let gates = match admission_gates(catalogue, rule_id, segment, &labels) {
                    Some(g) => g,
                    None => continue,
                };
                let mut reason = ReasonPayload {
                    gates,
                    ..ReasonPayload::default()
                };
                reason.labels.insert(label.clone());
                reason.gates.insert("clause_type".to_string(), true);
                add(&mut merged, rule_id, reason);
            }
        }
        for keyword in tables::keywords_for_label(label) {
            for rule_id in catalogue.index.rules_for_token(keyword) {
                let gates = match admission_gates(catalogue, rule_id, segment, &labels) {
                    Some(g) => g,
                    None => continue,
                };
                let mut reason = ReasonPayload {
                    gates,
                    ..ReasonPayload::default()
                };
                reason.labels.insert(label.clone());
                reason.gates.insert("keyword".to_string(), true);
                reason.patterns = keyword_offsets(&text_lower, segment.start, keyword);
                add(&mut merged, rule_id, reason);
            }
        }
    }

    // Typed entities fan out through fixed anchor tokens.
    if !features.amounts.is_empty() {
        let evidence = amount_evidence(features);
        for anchor in tables::AMOUNT_ANCHORS {
            entity_reasons(
                catalogue, segment, &labels, anchor, "entity_amounts",
                |reason| reason.amounts = evidence.clone(),
                &mut merged,
            );
        }
    }
    if !features.durations.is_empty() {
        let evidence = duration_evidence(features);
        for anchor in tables::DURATION_ANCHORS {
            entity_reasons(
                catalogue, segment, &labels, anchor, "entity_durations",
                |reason| reason.durations = evidence.clone(),
                &mut merged,
            );
        }
    }
    if !features.law_signals.is_empty() {
        let evidence = code_evidence(&features.law_signals);
        for anchor in tables::LAW_ANCHORS {
            entity_reasons(
                catalogue, segment, &labels, anchor, "entity_law",
                |reason| reason.law = evidence.clone(),
                &mut merged,
            );
        }
    }
    if !features.jurisdiction_signals.is_empty() {
        let evidence = code_evidence(&features.jurisdiction_signals);
        for anchor in tables::JURISDICTION_ANCHORS {
            entity_reasons(
                catalogue, segment, &labels, anchor, "entity_jurisdiction",
                |reason| reason.jurisdiction = evidence.clone(),
                &mut merged,
            );
        }
    }

    // Segment text tokens, restricted to the legal allow-list.
    let text_tokens: BTreeSet<String> = tokenize(&segment.combined_text()).into_iter().collect();
    for token in &text_tokens {
        if !tables::is_legal_token(token) {
            continue;
        }
        for rule_id in catalogue.index.rules_for_token(token) {
            let gates = match admission_gates(catalogue, rule_id, segment, &labels) {
                Some(g) => g,
                None => continue,
            };
            let mut reason = ReasonPayload {
                gates,
                ..ReasonPayload::default()
            };
            reason.gates.insert("segment_token".to_string(), true);
            reason.patterns = keyword_offsets(&text_lower, segment.start, token);
            add(&mut merged, rule_id, reason);
        }
    }

    // Fallback: clause-type-only lookup when nothing else produced a reason.
    if merged.is_empty() {
        if let Some(clause_type) = &segment.clause_type {
            for rule_id in catalogue.index.rules_for_clause_type(clause_type) {
                let gates = match admission_gates(catalogue, rule_id, segment, &labels) {
                    Some(g) => g,
                    None => continue,
                };
                let mut reason = ReasonPayload {
                    gates,
                    ..ReasonPayload::default()
                };
                reason.labels.insert(normalize_label(clause_type));
                reason.gates.insert("clause_type_fallback".to_string(), true);
                add(&mut merged, rule_id, reason);
            }
        }
    }

    let out: Vec<Candidate> = merged
        .into_iter()
        .take(caps.max_candidates)
        .map(|(rule_id, reasons)| Candidate {
            rule_id,
            reasons: reasons.into_iter().take(caps.max_reasons).collect(),
        })
        .collect();
    debug!(segment = %segment.id, candidates = out.len(), "dispatch complete");
    out
}

fn normalized_labels(segment: &Segment, features: &FeatureSet) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    if let Some(clause_type) = &segment.clause_type {
        labels.insert(normalize_label(clause_type));
    }
    for label in &features.labels {
        labels.insert(normalize_label(label));
    }
    labels.remove("");
    labels
}

/// Applicability filters declared by the rule. `None` means the rule is
/// inadmissible for this segment; otherwise the map names each filter that
/// was present and passed.
fn admission_gates(
    catalogue: &CompiledCatalogue,
    rule_id: &str,
    segment: &Segment,
    labels: &BTreeSet<String>,
) -> Option<BTreeMap<String, bool>> {
    let rule = catalogue.rules.get(rule_id)?;
    let mut gates = BTreeMap::new();
    if let (Some(want), Some(have)) = (&rule.applies_to_segment_kind, &segment.kind) {
        if want != have {
            return None;
        }
        gates.insert("segment_kind".to_string(), true);
    }
    if !rule.applies_to_labels.is_empty() {
        let admitted = rule
            .applies_to_labels
            .iter()
            .any(|l| labels.contains(&normalize_label(l)));
        if !admitted {
            return None;
        }
        gates.insert("labels".to_string(), true);
    }
    Some(gates)
}

fn entity_reasons(
    catalogue: &CompiledCatalogue,
    segment: &Segment,
    labels: &BTreeSet<String>,
    anchor: &str,
    gate: &str,
    fill: impl Fn(&mut ReasonPayload),
    merged: &mut BTreeMap<String, BTreeSet<ReasonPayload>>,
) {
    for rule_id in catalogue.index.rules_for_token(anchor) {
        let gates = match admission_gates(catalogue, rule_id, segment, labels) {
            Some(g) => g,
            None => continue,
        };
        let mut reason = ReasonPayload {
            gates,
            ..ReasonPayload::default()
        };
        reason.gates.insert(gate.to_string(), true);
        fill(&mut reason);
        add(merged, rule_id, reason);
    }
}

fn add(merged: &mut BTreeMap<String, BTreeSet<ReasonPayload>>, rule_id: &str, reason: ReasonPayload) {
    merged
        .entry(rule_id.to_string())
        .or_default()
        .insert(reason);
}

/// Occurrences of `needle` in the lowercased segment text, as offsets into
/// the normalized document text.
fn keyword_offsets(text_lower: &str, base: usize, needle: &str) -> Vec<PatternEvidence> {
    text_lower
        .match_indices(needle)
        .map(|(at, m)| PatternEvidence {
            kind: PatternKind::Keyword,
            start: base + at,
            end: base + at + m.len(),
        })
        .collect()
}

fn amount_evidence(features: &FeatureSet) -> Vec<AmountEvidence> {
    let mut out: Vec<AmountEvidence> = features
        .amounts
        .iter()
        .map(|a| AmountEvidence {
            currency: a.currency.clone(),
            value: a.value,
            start: a.start,
            end: a.end,
        })
        .collect();
    out.sort();
    out
}

fn duration_evidence(features: &FeatureSet) -> Vec<DurationEvidence> {
    let mut out: Vec<DurationEvidence> = features
        .durations
        .iter()
        .map(|d| DurationEvidence {
            unit: d.unit.clone(),
            value: d.value,
            start: d.start,
            end: d.end,
        })
        .collect();
    out.sort();
    out
}

fn code_evidence(signals: &[crate::model::features::LawSignal]) -> Vec<CodeEvidence> {
    let mut out: Vec<CodeEvidence> = signals
        .iter()
        .map(|s| CodeEvidence {
            code: s.code.clone(),
            start: s.start,
            end: s.end,
        })
        .collect();
    out.sort();
    out
}

use crate::graph::param_graph::{DurationKind, DurationValue, Money, ParamGraph, TriState};
use crate::model::doc::{in_document_order, Segment};
use crate::model::features::DocFeatures;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| Regex::new("^$").unwrap())
}

/// Assemble the whole-document parameter graph. Extraction is independent
/// per field and always walks segments in document order, so permuting the
/// input segment slice yields an identical graph.
pub fn build_param_graph(doc_features: &DocFeatures, segments: &[Segment]) -> ParamGraph {
    let ordered = in_document_order(segments);

    let mut graph = ParamGraph {
        parties: doc_features.parties.clone(),
        signatures: doc_features.signatures.clone(),
        doc_flags: doc_features.doc_flags.clone(),
        ..ParamGraph::default()
    };

    extract_durations(&ordered, &mut graph);
    extract_money(&ordered, &mut graph);
    extract_governing_law(&ordered, &mut graph);
    extract_jurisdiction(&ordered, &mut graph);
    extract_survival(&ordered, &mut graph);
    extract_annexes(&ordered, &mut graph);
    extract_numbering_and_refs(&ordered, &mut graph);
    extract_undefined_terms(&ordered, doc_features, &mut graph);

    graph
}

// Durations

fn duration_regex() -> Regex {
    re(r"(?i)\b(\d{1,4})\s+(business\s+|working\s+)?(day|week|month|year)s?\b")
}

fn parse_duration(cap: &regex::Captures) -> DurationValue {
    let value: i64 = cap
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let kind = if cap.get(2).is_some() {
        DurationKind::Business
    } else {
        DurationKind::Calendar
    };
    let days = match cap.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(u) if u == "week" => value * 7,
        Some(u) if u == "month" => value * 30,
        Some(u) if u == "year" => value * 365,
        _ => value,
    };
    DurationValue { days, kind }
}

/// First duration match at or after the context keyword.
fn duration_after(
    text: &str,
    context: &Regex,
    duration: &Regex,
) -> Option<(DurationValue, (usize, usize))> {
    let at = context.find(text)?.start();
    for cap in duration.captures_iter(text) {
        let m = match cap.get(0) {
            Some(m) => m,
            None => continue,
        };
        if m.start() < at {
            continue;
        }
        return Some((parse_duration(&cap), (m.start(), m.end())));
    }
    None
}

fn extract_durations(ordered: &[&Segment], graph: &mut ParamGraph) {
    let duration = duration_regex();
    let payment_ctx = re(r"(?i)\b(?:payable|invoices?|invoiced|payment)\b");
    let term_ctx = re(
        r"(?i)\b(?:initial term|term of this agreement|agreement shall (?:commence|continue|remain)|duration of this agreement)\b",
    );
    let grace_ctx = re(r"(?i)\bgrace\b");
    let cure_ctx = re(r"(?i)\b(?:cure[ds]?|remedy|remedied)\b");
    // Notice durations usually precede the keyword ("30 days' notice").
    let notice_before = re(
        r"(?i)\b(\d{1,4})\s+(business\s+|working\s+)?(day)s?'?\s+(?:prior\s+|written\s+|advance\s+)*notice\b",
    );
    let notice_after = re(r"(?i)\bnotice\s+period\s+of\b");

    for segment in ordered {
        let text = segment.text.as_str();

        if graph.payment_term.is_none() {
            if let Some((value, span)) = duration_after(text, &payment_ctx, &duration) {
                graph.payment_term = Some(value);
                graph.set_source("payment_term", &segment.id, Some(abs(segment, span)));
            }
        }
        if graph.contract_term.is_none() {
            if let Some((value, span)) = duration_after(text, &term_ctx, &duration) {
                graph.contract_term = Some(value);
                graph.set_source("contract_term", &segment.id, Some(abs(segment, span)));
            }
        }
        if graph.grace_period.is_none() {
            if let Some((value, span)) = duration_after(text, &grace_ctx, &duration) {
                graph.grace_period = Some(value);
                graph.set_source("grace_period", &segment.id, Some(abs(segment, span)));
            }
        }
        if graph.cure_period.is_none() {
            if let Some((value, span)) = duration_after(text, &cure_ctx, &duration) {
                graph.cure_period = Some(value);
                graph.set_source("cure_period", &segment.id, Some(abs(segment, span)));
            }
        }
        if graph.notice_period.is_none() {
            let hit = notice_before
                .captures(text)
                .and_then(|cap| cap.get(0).map(|m| (parse_duration(&cap), (m.start(), m.end()))))
                .or_else(|| duration_after(text, &notice_after, &duration));
            if let Some((value, span)) = hit {
                graph.notice_period = Some(value);
                graph.set_source("notice_period", &segment.id, Some(abs(segment, span)));
            }
        }
    }
}

// Money

fn money_regex() -> Regex {
    re(r"(?i)(£|\$|€|\bGBP\b|\bUSD\b|\bEUR\b)\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)")
}

fn normalize_currency(symbol: &str) -> String {
    match symbol {
        "£" => "GBP".to_string(),
        "$" => "USD".to_string(),
        "€" => "EUR".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

fn parse_money(cap: &regex::Captures) -> Option<Money> {
    let currency = normalize_currency(cap.get(1)?.as_str());
    // Float parsing saturates overflow to infinity; such a token is no match.
    let amount: f64 = cap.get(2)?.as_str().replace(',', "").parse().ok()?;
    if !amount.is_finite() {
        return None;
    }
    Some(Money { amount, currency })
}

fn extract_money(ordered: &[&Segment], graph: &mut ParamGraph) {
    let money = money_regex();
    let cap_ctx = re(r"(?i)\b(?:liability|liable)\b[^.]*?\b(?:exceed|capped|limited\s+to|limit\s+of)\b");

    for segment in ordered {
        let text = segment.text.as_str();

        if graph.contract_currency.is_none() {
            if let Some(cap) = money.captures(text) {
                if let (Some(m), Some(value)) = (cap.get(0), parse_money(&cap)) {
                    graph.contract_currency = Some(value.currency);
                    graph.set_source(
                        "contract_currency",
                        &segment.id,
                        Some(abs(segment, (m.start(), m.end()))),
                    );
                }
            }
        }
        if graph.cap.is_none() {
            if let Some(at) = cap_ctx.find(text).map(|m| m.start()) {
                for cap in money.captures_iter(text) {
                    let m = match cap.get(0) {
                        Some(m) => m,
                        None => continue,
                    };
                    if m.start() < at {
                        continue;
                    }
                    if let Some(value) = parse_money(&cap) {
                        graph.cap = Some(value);
                        graph.set_source("cap", &segment.id, Some(abs(segment, (m.start(), m.end()))));
                    }
                    break;
                }
            }
        }
    }
}

// Governing law and jurisdiction

fn extract_governing_law(ordered: &[&Segment], graph: &mut ParamGraph) {
    let law = re(
        r"(?im)governed\s+by(?:\s+and\s+construed\s+in\s+accordance\s+with)?\s+the\s+laws?\s+of\s+([A-Za-z][A-Za-z ]+?)\s*(?:[.,;]|$)",
    );
    for segment in ordered {
        if let Some(cap) = law.captures(&segment.text) {
            if let Some(m) = cap.get(1) {
                graph.governing_law = Some(collapse_spaces(m.as_str()));
                graph.set_source(
                    "governing_law",
                    &segment.id,
                    Some(abs(segment, (m.start(), m.end()))),
                );
                return;
            }
        }
    }
}

fn extract_jurisdiction(ordered: &[&Segment], graph: &mut ParamGraph) {
    let courts = re(r"(?im)\b(courts?\s+of\s+[A-Za-z][A-Za-z ]+?)\s*(?:[.,;]|$)");
    let exclusive = re(r"(?i)\bexclusive\s+jurisdiction\s+of\s+the\s+([A-Za-z][A-Za-z ]+?courts?)\b");
    for segment in ordered {
        let cap = courts
            .captures(&segment.text)
            .or_else(|| exclusive.captures(&segment.text));
        if let Some(cap) = cap {
            if let Some(m) = cap.get(1) {
                graph.jurisdiction = Some(collapse_spaces(m.as_str()));
                graph.set_source(
                    "jurisdiction",
                    &segment.id,
                    Some(abs(segment, (m.start(), m.end()))),
                );
                return;
            }
        }
    }
}

// Survival

fn extract_survival(ordered: &[&Segment], graph: &mut ParamGraph) {
    let ctx = re(r"(?i)\bsurviv(?:e|es|al|ing)\b");
    let clause_list = re(r"(?i)\bclauses?\s+((?:\d+(?:\.\d+)*)(?:\s*(?:,|and|&)\s*\d+(?:\.\d+)*)*)");
    let number = re(r"\d+(?:\.\d+)*");
    let named = re(
        r"(?i)\b(confidentiality|liability|indemnity|indemnification|intellectual property|data protection)\b",
    );

    let mut anchored = false;
    for segment in ordered {
        let text = segment.text.as_str();
        if !ctx.is_match(text) {
            continue;
        }
        if !anchored {
            graph.set_source("survival_clause", &segment.id, None);
            anchored = true;
        }
        let mut found_here = false;
        for list in clause_list.captures_iter(text) {
            if let Some(body) = list.get(1) {
                for n in number.find_iter(body.as_str()) {
                    graph.survival_items.insert(n.as_str().to_string());
                    found_here = true;
                }
            }
        }
        for cap in named.captures_iter(text) {
            if let Some(m) = cap.get(1) {
                graph
                    .survival_items
                    .insert(m.as_str().to_ascii_lowercase().replace(' ', "_"));
                found_here = true;
            }
        }
        if found_here && !graph.sources.contains_key("survival_items") {
            graph.set_source("survival_items", &segment.id, None);
        }
    }
}

// Annexes and order of precedence

fn extract_annexes(ordered: &[&Segment], graph: &mut ParamGraph) {
    let annex = re(r"(?i)\b(annex|schedule|appendix|exhibit)\s+([A-Z0-9]+)\b");
    let precedence = re(
        r"(?i)\border\s+of\s+precedence\b|\bin\s+the\s+event\s+of\s+(?:any\s+)?(?:conflict|inconsistency)\b|\bshall\s+prevail\b",
    );

    for segment in ordered {
        for cap in annex.captures_iter(&segment.text) {
            if let (Some(kind), Some(id)) = (cap.get(1), cap.get(2)) {
                let mut kind = kind.as_str().to_ascii_lowercase();
                if let Some(first) = kind.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                let item = format!("{kind} {}", id.as_str().to_ascii_uppercase());
                if graph.annex_refs.insert(item) && !graph.sources.contains_key("annex_refs") {
                    graph.set_source("annex_refs", &segment.id, None);
                }
            }
        }
        if graph.order_of_precedence != TriState::Present && precedence.is_match(&segment.text) {
            graph.order_of_precedence = TriState::Present;
            graph.set_source("order_of_precedence", &segment.id, None);
        }
    }
    if graph.order_of_precedence == TriState::Unknown && !ordered.is_empty() {
        graph.order_of_precedence = TriState::Absent;
    }
}

// Clause numbering and cross-references

fn extract_numbering_and_refs(ordered: &[&Segment], graph: &mut ParamGraph) {
    let clause_list = re(r"(?i)\bclauses?\s+((?:\d+(?:\.\d+)*)(?:\s*(?:,|and|&)\s*\d+(?:\.\d+)*)*)");
    let number = re(r"\d+(?:\.\d+)*");

    for segment in ordered {
        if let Some(n) = &segment.number {
            graph
                .clause_numbers
                .insert(n.trim_end_matches('.').to_string());
        }
    }
    for segment in ordered {
        let from = segment
            .number
            .as_deref()
            .map(|n| n.trim_end_matches('.'))
            .unwrap_or(segment.id.as_str())
            .to_string();
        for list in clause_list.captures_iter(&segment.text) {
            if let Some(body) = list.get(1) {
                for n in number.find_iter(body.as_str()) {
                    let to = n.as_str().to_string();
                    if to != from {
                        graph.cross_refs.insert((from.clone(), to));
                    }
                }
            }
        }
    }

    graph.numbering_gaps = numbering_gaps(&graph.clause_numbers);
}

fn numbering_gaps(numbers: &BTreeSet<String>) -> Vec<String> {
    let mut children: BTreeMap<Vec<u32>, BTreeSet<u32>> = BTreeMap::new();
    for raw in numbers {
        let path: Vec<u32> = match raw.split('.').map(str::parse).collect() {
            Ok(p) => p,
            Err(_) => continue,
        };
        for depth in 0..path.len() {
            children
                .entry(path[..depth].to_vec())
                .or_default()
                .insert(path[depth]);
        }
    }

    let mut gaps = Vec::new();
    for (parent, present) in children {
        let (min, max) = match (present.iter().next(), present.iter().next_back()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => continue,
        };
        for n in min..=max {
            if present.contains(&n) {
                continue;
            }
            let mut path: Vec<String> = parent.iter().map(u32::to_string).collect();
            path.push(n.to_string());
            gaps.push(path.join("."));
        }
    }
    gaps
}

// Undefined terms

const TERM_STOP_PREFIXES: &[&str] = &[
    "The", "This", "In", "If", "Subject", "Any", "Each", "No", "Such", "Upon", "For",
];

fn extract_undefined_terms(ordered: &[&Segment], doc_features: &DocFeatures, graph: &mut ParamGraph) {
    let defined = re(r#"["“]([A-Za-z][A-Za-z0-9 /-]{1,60})["”]\s+(?:shall\s+)?(?:mean|means|have the meaning)"#);
    let candidate = re(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3})\b");

    let mut defined_terms: BTreeSet<String> = BTreeSet::new();
    for segment in ordered {
        for cap in defined.captures_iter(&segment.text) {
            if let Some(m) = cap.get(1) {
                defined_terms.insert(m.as_str().to_string());
            }
        }
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for segment in ordered {
        for cap in candidate.captures_iter(&segment.text) {
            if let Some(m) = cap.get(1) {
                *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
            }
        }
    }

    for (term, count) in counts {
        if count < 2 || defined_terms.contains(&term) {
            continue;
        }
        if TERM_STOP_PREFIXES
            .iter()
            .any(|p| term.starts_with(&format!("{p} ")))
        {
            continue;
        }
        let lower = term.to_lowercase();
        let is_party = doc_features.parties.iter().any(|p| {
            let name = p.name.to_lowercase();
            name.contains(&lower) || lower.contains(&name)
        });
        if is_party {
            continue;
        }
        graph.undefined_terms.insert(term);
    }
}

fn abs(segment: &Segment, span: (usize, usize)) -> (usize, usize) {
    (segment.start + span.0, segment.start + span.1)
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Cross-clause constraint battery.
//!
//! Every check is a pure function of the parameter graph. A check either
//! fires, producing one finding, or stays silent; missing inputs mean
//! silence, never an error. Checks run in a fixed order so the output
//! vector is deterministic for a given graph.

use crate::dsl::ENGINE_VERSION;
use crate::graph::param_graph::{DurationKind, ParamGraph, TriState};
use crate::model::finding::{Finding, FindingSeverity, LocaleMap, BASE_LOCALE};
use std::collections::{BTreeMap, BTreeSet};

struct Fired {
    code: &'static str,
    severity: FindingSeverity,
    title: &'static str,
    message: String,
    evidence: Vec<String>,
}

const CHECKS: &[fn(&ParamGraph) -> Option<Fired>] = &[
    payment_term_within_contract,
    notice_within_contract,
    cure_within_notice,
    law_and_jurisdiction_agree,
    law_without_jurisdiction,
    cap_currency_matches,
    cap_is_positive,
    company_numbers_unique,
    parties_have_signatures,
    numbering_is_contiguous,
    terms_are_defined,
    annexes_have_precedence,
    cross_refs_resolve,
    survival_names_items,
    day_conventions_consistent,
];

/// Run the battery over a graph. `ts_utc` lands in `created_at` unchanged.
pub fn evaluate(graph: &ParamGraph, ts_utc: &str) -> Vec<Finding> {
    CHECKS
        .iter()
        .filter_map(|check| check(graph))
        .map(|fired| build(fired, ts_utc))
        .collect()
}

fn build(fired: Fired, ts_utc: &str) -> Finding {
    Finding {
        rule_id: format!("L2::{}", fired.code),
        title: en(fired.title),
        message: en(&fired.message),
        explain: LocaleMap::new(),
        suggestion: LocaleMap::new(),
        severity: fired.severity,
        evidence: fired.evidence,
        citation: Vec::new(),
        flags: Vec::new(),
        version: "1".to_string(),
        engine_version: ENGINE_VERSION.to_string(),
        created_at: ts_utc.to_string(),
    }
}

fn en(text: &str) -> LocaleMap {
    let mut m = LocaleMap::new();
    m.insert(BASE_LOCALE.to_string(), text.to_string());
    m
}

fn src(graph: &ParamGraph, field: &str) -> Option<String> {
    graph.source_clause(field).map(|c| format!("source:{field}={c}"))
}

fn payment_term_within_contract(g: &ParamGraph) -> Option<Fired> {
    let payment = g.payment_term?;
    let term = g.contract_term?;
    let grace = g.grace_period.map(|d| d.days).unwrap_or(0);
    if payment.days <= term.days - grace {
        return None;
    }
    let mut evidence = vec![
        format!("payment_term:{}d", payment.days),
        format!("contract_term:{}d", term.days),
        format!("grace_period:{grace}d"),
    ];
    evidence.extend(src(g, "payment_term"));
    evidence.extend(src(g, "contract_term"));
    evidence.extend(src(g, "grace_period"));
    Some(Fired {
        code: "L2-001",
        severity: FindingSeverity::High,
        title: "Payment term exceeds contract term",
        message: format!(
            "a {}-day payment term cannot be honoured within a {}-day contract term after a {}-day grace period",
            payment.days, term.days, grace
        ),
        evidence,
    })
}

fn notice_within_contract(g: &ParamGraph) -> Option<Fired> {
    let notice = g.notice_period?;
    let term = g.contract_term?;
    if notice.days <= term.days {
        return None;
    }
    let mut evidence = vec![
        format!("notice_period:{}d", notice.days),
        format!("contract_term:{}d", term.days),
    ];
    evidence.extend(src(g, "notice_period"));
    evidence.extend(src(g, "contract_term"));
    Some(Fired {
        code: "L2-002",
        severity: FindingSeverity::Medium,
        title: "Notice period exceeds contract term",
        message: format!(
            "the {}-day notice period is longer than the {}-day contract term",
            notice.days, term.days
        ),
        evidence,
    })
}

fn cure_within_notice(g: &ParamGraph) -> Option<Fired> {
    let cure = g.cure_period?;
    let notice = g.notice_period?;
    if cure.days <= notice.days {
        return None;
    }
    let mut evidence = vec![
        format!("cure_period:{}d", cure.days),
        format!("notice_period:{}d", notice.days),
    ];
    evidence.extend(src(g, "cure_period"));
    evidence.extend(src(g, "notice_period"));
    Some(Fired {
        code: "L2-003",
        severity: FindingSeverity::Medium,
        title: "Cure period exceeds notice period",
        message: format!(
            "a breach gets {} days to cure but termination needs only {} days' notice",
            cure.days, notice.days
        ),
        evidence,
    })
}

fn jurisdiction_country(jurisdiction: &str) -> String {
    let lower = jurisdiction.to_lowercase();
    match lower.find("courts of ") {
        Some(at) => lower[at + "courts of ".len()..].trim().to_string(),
        None => lower.trim().to_string(),
    }
}

fn law_and_jurisdiction_agree(g: &ParamGraph) -> Option<Fired> {
    let law = g.governing_law.as_deref()?;
    let jurisdiction = g.jurisdiction.as_deref()?;
    if g.doc_flags.get("jurisdiction_carveout").copied().unwrap_or(false) {
        return None;
    }
    let law_country = law.trim().to_lowercase();
    let juris_country = jurisdiction_country(jurisdiction);
    if law_country.contains(&juris_country) || juris_country.contains(&law_country) {
        return None;
    }
    let mut evidence = vec![
        format!("governing_law:{law_country}"),
        format!("jurisdiction:{juris_country}"),
    ];
    evidence.extend(src(g, "governing_law"));
    evidence.extend(src(g, "jurisdiction"));
    Some(Fired {
        code: "L2-010",
        severity: FindingSeverity::High,
        title: "Governing law and jurisdiction disagree",
        message: format!(
            "the contract is governed by the law of {law_country} but disputes go to the courts of {juris_country}"
        ),
        evidence,
    })
}

fn law_without_jurisdiction(g: &ParamGraph) -> Option<Fired> {
    let law = g.governing_law.as_deref()?;
    if g.jurisdiction.is_some() {
        return None;
    }
    let mut evidence = vec![format!("governing_law:{}", law.trim().to_lowercase())];
    evidence.extend(src(g, "governing_law"));
    Some(Fired {
        code: "L2-011",
        severity: FindingSeverity::Medium,
        title: "Governing law without jurisdiction",
        message: "a governing law is chosen but no court is given jurisdiction over disputes"
            .to_string(),
        evidence,
    })
}

fn cap_currency_matches(g: &ParamGraph) -> Option<Fired> {
    let cap = g.cap.as_ref()?;
    let contract_currency = g.contract_currency.as_deref()?;
    if cap.currency == contract_currency {
        return None;
    }
    let mut evidence = vec![
        format!("cap_currency:{}", cap.currency),
        format!("contract_currency:{contract_currency}"),
    ];
    evidence.extend(src(g, "cap"));
    evidence.extend(src(g, "contract_currency"));
    Some(Fired {
        code: "L2-020",
        severity: FindingSeverity::High,
        title: "Liability cap in a different currency",
        message: format!(
            "the liability cap is denominated in {} while the contract transacts in {contract_currency}",
            cap.currency
        ),
        evidence,
    })
}

fn cap_is_positive(g: &ParamGraph) -> Option<Fired> {
    let cap = g.cap.as_ref()?;
    if cap.amount > 0.0 {
        return None;
    }
    let mut evidence = vec![format!("cap_amount:{}", cap.amount)];
    evidence.extend(src(g, "cap"));
    Some(Fired {
        code: "L2-021",
        severity: FindingSeverity::High,
        title: "Liability cap is not positive",
        message: format!("a liability cap of {} {} caps nothing", cap.amount, cap.currency),
        evidence,
    })
}

fn company_numbers_unique(g: &ParamGraph) -> Option<Fired> {
    let mut by_number: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for party in &g.parties {
        let number = match party.company_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => continue,
        };
        by_number.entry(number).or_default().insert(party.name.as_str());
    }
    let mut evidence = Vec::new();
    for (number, names) in &by_number {
        if names.len() > 1 {
            let names: Vec<&str> = names.iter().copied().collect();
            evidence.push(format!("company_number:{number}={}", names.join("|")));
        }
    }
    if evidence.is_empty() {
        return None;
    }
    Some(Fired {
        code: "L2-030",
        severity: FindingSeverity::High,
        title: "One company number, several party names",
        message: format!(
            "{} company number(s) are shared by parties under different names",
            evidence.len()
        ),
        evidence,
    })
}

fn parties_have_signatures(g: &ParamGraph) -> Option<Fired> {
    let mut unsigned = Vec::new();
    for party in &g.parties {
        let signed = g.signatures.iter().any(|s| {
            s.party_name.trim().eq_ignore_ascii_case(party.name.trim())
        });
        if !signed {
            unsigned.push(format!("party:{}", party.name));
        }
    }
    if unsigned.is_empty() {
        return None;
    }
    Some(Fired {
        code: "L2-031",
        severity: FindingSeverity::Medium,
        title: "Party without a signature block",
        message: format!(
            "{} of {} contracting parties have no matching signature block",
            unsigned.len(),
            g.parties.len()
        ),
        evidence: unsigned,
    })
}

fn numbering_is_contiguous(g: &ParamGraph) -> Option<Fired> {
    if g.numbering_gaps.is_empty() {
        return None;
    }
    Some(Fired {
        code: "L2-040",
        severity: FindingSeverity::Low,
        title: "Clause numbering has gaps",
        message: format!(
            "{} clause number(s) are skipped in the numbering sequence",
            g.numbering_gaps.len()
        ),
        evidence: g.numbering_gaps.iter().map(|n| format!("missing:{n}")).collect(),
    })
}

fn terms_are_defined(g: &ParamGraph) -> Option<Fired> {
    if g.undefined_terms.is_empty() {
        return None;
    }
    Some(Fired {
        code: "L2-041",
        severity: FindingSeverity::Low,
        title: "Capitalized terms without definitions",
        message: format!(
            "{} capitalized term(s) are used repeatedly but never defined",
            g.undefined_terms.len()
        ),
        evidence: g.undefined_terms.iter().map(|t| format!("term:{t}")).collect(),
    })
}

fn annexes_have_precedence(g: &ParamGraph) -> Option<Fired> {
    if g.annex_refs.len() < 2 || g.order_of_precedence == TriState::Present {
        return None;
    }
    let mut evidence: Vec<String> =
        g.annex_refs.iter().map(|a| format!("annex:{a}")).collect();
    evidence.extend(src(g, "annex_refs"));
    Some(Fired {
        code: "L2-042",
        severity: FindingSeverity::Medium,
        title: "Several annexes, no order of precedence",
        message: format!(
            "{} annexes are incorporated but no clause says which document prevails on conflict",
            g.annex_refs.len()
        ),
        evidence,
    })
}

fn cross_refs_resolve(g: &ParamGraph) -> Option<Fired> {
    let mut dangling = Vec::new();
    for (from, to) in &g.cross_refs {
        let child_prefix = format!("{to}.");
        let resolves = g.clause_numbers.contains(to)
            || g.clause_numbers.iter().any(|n| n.starts_with(&child_prefix));
        if !resolves {
            dangling.push(format!("ref:{from}->{to}"));
        }
    }
    if dangling.is_empty() {
        return None;
    }
    Some(Fired {
        code: "L2-043",
        severity: FindingSeverity::Medium,
        title: "Reference to a clause that does not exist",
        message: format!("{} cross-reference(s) point at clause numbers absent from the document", dangling.len()),
        evidence: dangling,
    })
}

fn survival_names_items(g: &ParamGraph) -> Option<Fired> {
    if !g.sources.contains_key("survival_clause") || !g.survival_items.is_empty() {
        return None;
    }
    let mut evidence = Vec::new();
    evidence.extend(src(g, "survival_clause"));
    Some(Fired {
        code: "L2-050",
        severity: FindingSeverity::Low,
        title: "Survival clause names nothing",
        message: "a survival clause exists but names no obligations that survive termination"
            .to_string(),
        evidence,
    })
}

fn day_conventions_consistent(g: &ParamGraph) -> Option<Fired> {
    let fields = [
        ("payment_term", g.payment_term),
        ("contract_term", g.contract_term),
        ("grace_period", g.grace_period),
        ("notice_period", g.notice_period),
        ("cure_period", g.cure_period),
    ];
    let mut business = Vec::new();
    let mut calendar = Vec::new();
    for (name, value) in fields {
        match value.map(|d| d.kind) {
            Some(DurationKind::Business) => business.push(name),
            Some(DurationKind::Calendar) => calendar.push(name),
            None => {}
        }
    }
    if business.is_empty() || calendar.is_empty() {
        return None;
    }
    let mut evidence: Vec<String> = business.iter().map(|f| format!("business:{f}")).collect();
    evidence.extend(calendar.iter().map(|f| format!("calendar:{f}")));
    Some(Fired {
        code: "L2-051",
        severity: FindingSeverity::Medium,
        title: "Business and calendar days mixed",
        message: format!(
            "{} deadline(s) count business days while {} count calendar days",
            business.len(),
            calendar.len()
        ),
        evidence,
    })
}

//! Bridge to the pattern-era execution convention.
//!
//! The bridge returns `Result<Vec<LegacyFinding>, AdapterError>`; the
//! conversion of an `AdapterError` into a synthetic "System" finding
//! happens at a single call site in [`crate::engine::exec`], never here.

use crate::catalogue::rule::Rule;
use crate::model::doc::Segment;
use crate::model::finding::LegacyFinding;
use std::collections::BTreeSet;
use std::fmt;

/// Failure raised by the bridged execution convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterError {
    pub rule_id: String,
    pub detail: String,
}

impl AdapterError {
    pub fn new(rule_id: &str, detail: impl Into<String>) -> AdapterError {
        AdapterError {
            rule_id: rule_id.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}: {}", self.rule_id, self.detail)
    }
}

impl std::error::Error for AdapterError {}

/// Execute a rule under the old convention.
///
/// A declared delegate supersedes the rule's own patterns, exactly as the
/// external handler superseded the pattern file it replaced; with no
/// handler linked into this build, delegation is an [`AdapterError`].
pub fn execute(rule: &Rule, segment: &Segment) -> Result<Vec<LegacyFinding>, AdapterError> {
    if let Some(delegate) = &rule.delegate {
        return Err(AdapterError::new(
            &rule.id,
            format!("delegate handler '{delegate}' is not linked into this build"),
        ));
    }

    let mut spans: BTreeSet<(usize, usize)> = BTreeSet::new();
    for pattern in &rule.patterns {
        for m in pattern.find_iter(&segment.text) {
            spans.insert((segment.start + m.start(), segment.start + m.end()));
        }
    }
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    let message = if rule.advice.is_empty() {
        format!("pattern rule {} matched", rule.id)
    } else {
        rule.advice.clone()
    };
    Ok(vec![LegacyFinding {
        rule_id: rule.id.clone(),
        severity: rule.severity,
        message,
        evidence: spans
            .into_iter()
            .map(|(s, e)| format!("span:{s}..{e}"))
            .collect(),
        citations: Vec::new(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::source::RuleFormat;
    use crate::model::finding::Severity;
    use regex::Regex;

    fn pattern_rule(id: &str, patterns: &[&str]) -> Rule {
        Rule {
            id: id.to_string(),
            clause_type: "payment".to_string(),
            pack: "uk_core".to_string(),
            severity: Severity::High,
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
            advice: "interest on late payment must be stated".to_string(),
            doc_types: Vec::new(),
            jurisdiction: None,
            requires_clause: None,
            applies_to_labels: Vec::new(),
            applies_to_segment_kind: None,
            channel: None,
            salience: 50,
            format: RuleFormat::Pattern,
            dsl: None,
            delegate: None,
        }
    }

    fn seg(start: usize, text: &str) -> Segment {
        Segment {
            id: "s1".to_string(),
            start,
            end: start + text.len(),
            text: text.to_string(),
            heading: None,
            clause_type: None,
            number: None,
            kind: None,
        }
    }

    #[test]
    fn matches_yield_one_finding_with_absolute_spans() {
        let rule = pattern_rule("PAY-001", &[r"late payment", r"interest"]);
        let segment = seg(100, "no interest accrues on late payment");
        let findings = execute(&rule, &segment).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "PAY-001");
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(
            findings[0].evidence,
            vec!["span:103..111".to_string(), "span:123..135".to_string()]
        );
    }

    #[test]
    fn no_match_is_empty_not_an_error() {
        let rule = pattern_rule("PAY-001", &[r"indemnif"]);
        let findings = execute(&rule, &seg(0, "payment within 30 days")).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn delegate_without_handler_is_an_adapter_error() {
        let mut rule = pattern_rule("HYB-001", &[]);
        rule.format = RuleFormat::Hybrid;
        rule.delegate = Some("handlers/hyb_001.py".to_string());
        let err = execute(&rule, &seg(0, "anything")).unwrap_err();
        assert_eq!(err.rule_id, "HYB-001");
        assert!(err.detail.contains("handlers/hyb_001.py"));
    }
}

use crate::dsl::expr::{parse_expr, Expr};
use crate::dsl::ENGINE_VERSION;
use crate::error::{CoreError, CoreResult};
use crate::model::finding::{Finding, FindingSeverity, LocaleMap, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Applicability filters shared by both rule file shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppliesTo {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub segment_kind: Option<String>,
}

/// One check in a DSL rule. `any_of` / `all_of` refine `when` with OR / AND
/// lists; `produce` adds check-specific evidence to the rule's declared
/// lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DslCheck {
    pub when: String,
    #[serde(default)]
    pub any_of: Vec<String>,
    #[serde(default)]
    pub all_of: Vec<String>,
    #[serde(default)]
    pub produce: Option<DslProduce>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DslProduce {
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub citation: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

/// A DSL rule file as authored. Kept verbatim on the compiled rule so the
/// VM emits findings from the author's own metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DslRule {
    pub id: String,
    #[serde(default)]
    pub pack: Option<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: LocaleMap,
    #[serde(default)]
    pub message: LocaleMap,
    #[serde(default)]
    pub explain: LocaleMap,
    #[serde(default)]
    pub suggestion: LocaleMap,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub citation: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub engine_version: Option<String>,
    #[serde(default)]
    pub checks: Vec<DslCheck>,
    /// Relative path of an external delegate handler. Marks the rule HYBRID.
    #[serde(default)]
    pub python: Option<String>,
    #[serde(default)]
    pub doc_types: Vec<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub requires_clause: Option<String>,
    #[serde(default)]
    pub applies_to: Option<AppliesTo>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub salience: Option<i64>,
}

fn default_severity() -> String {
    "Medium".to_string()
}

fn default_version() -> String {
    "1".to_string()
}

pub fn ensure_engine_version(rule: &DslRule) -> CoreResult<()> {
    match rule.engine_version.as_deref() {
        Some(v) if v == ENGINE_VERSION => Ok(()),
        Some(v) => Err(CoreError::EngineVersionMismatch(format!(
            "rule {} declares engine_version {v}, interpreter is {ENGINE_VERSION}",
            rule.id
        ))),
        None => Err(CoreError::EngineVersionMismatch(format!(
            "rule {} declares no engine_version, interpreter is {ENGINE_VERSION}",
            rule.id
        ))),
    }
}

/// Run every check of `rule` against `context`.
///
/// The whole rule is parsed before anything is evaluated, so a malformed
/// expression anywhere in the rule is an error even when an earlier check
/// would already have fired. `context` is never mutated.
pub fn evaluate_rule(rule: &DslRule, context: &Value, ts_utc: &str) -> CoreResult<Vec<Finding>> {
    ensure_engine_version(rule)?;
    let severity: FindingSeverity = rule.severity.parse::<Severity>()?.into();

    let mut compiled: Vec<(Expr, Vec<Expr>, Vec<Expr>, &DslCheck)> = Vec::new();
    for check in &rule.checks {
        let when = parse_expr(&check.when)?;
        let any_of = check
            .any_of
            .iter()
            .map(|e| parse_expr(e))
            .collect::<CoreResult<Vec<_>>>()?;
        let all_of = check
            .all_of
            .iter()
            .map(|e| parse_expr(e))
            .collect::<CoreResult<Vec<_>>>()?;
        compiled.push((when, any_of, all_of, check));
    }

    let mut findings = Vec::new();
    for (when, any_of, all_of, check) in &compiled {
        if !when.evaluate(context) {
            continue;
        }
        if !any_of.is_empty() && !any_of.iter().any(|e| e.evaluate(context)) {
            continue;
        }
        if !all_of.iter().all(|e| e.evaluate(context)) {
            continue;
        }
        findings.push(emit(rule, severity, check.produce.as_ref(), ts_utc));
    }
    Ok(findings)
}

fn emit(
    rule: &DslRule,
    severity: FindingSeverity,
    produce: Option<&DslProduce>,
    ts_utc: &str,
) -> Finding {
    let empty = DslProduce::default();
    let produce = produce.unwrap_or(&empty);
    Finding {
        rule_id: rule.id.clone(),
        title: rule.title.clone(),
        message: rule.message.clone(),
        explain: rule.explain.clone(),
        suggestion: rule.suggestion.clone(),
        severity,
        evidence: merge_unique(&rule.evidence, &produce.evidence),
        citation: merge_unique(&rule.citation, &produce.citation),
        flags: merge_unique(&rule.flags, &produce.flags),
        version: rule.version.clone(),
        engine_version: ENGINE_VERSION.to_string(),
        created_at: ts_utc.to_string(),
    }
}

/// Union preserving first-seen order.
fn merge_unique(base: &[String], extra: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in base.iter().chain(extra.iter()) {
        if !out.iter().any(|seen| seen == s) {
            out.push(s.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: &str = "2024-01-01T00:00:00Z";

    fn nda_rule() -> DslRule {
        serde_json::from_value(json!({
            "id": "DSL-NDA-001",
            "pack": "confidentiality",
            "severity": "Medium",
            "title": {"en": "NDA marker present"},
            "message": {"en": "The text refers to an NDA."},
            "evidence": ["nda-marker"],
            "citation": ["handbook#nda"],
            "flags": [],
            "version": "3",
            "engine_version": ENGINE_VERSION,
            "checks": [
                {"when": "context.text contains 'NDA'"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn check_fires_on_matching_context() {
        let rule = nda_rule();
        let findings = evaluate_rule(&rule, &json!({"text": "NDA draft"}), TS).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "DSL-NDA-001");
        assert_eq!(findings[0].severity, FindingSeverity::Medium);
        assert_eq!(findings[0].evidence, vec!["nda-marker".to_string()]);
        assert_eq!(findings[0].version, "3");
        assert_eq!(findings[0].created_at, TS);

        let none = evaluate_rule(&rule, &json!({"text": "draft"}), TS).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn engine_version_mismatch_is_fatal_for_the_rule() {
        let mut rule = nda_rule();
        rule.engine_version = Some("0.9.9".to_string());
        let err = evaluate_rule(&rule, &json!({"text": "NDA"}), TS).unwrap_err();
        assert!(matches!(err, CoreError::EngineVersionMismatch(_)));

        rule.engine_version = None;
        let err = evaluate_rule(&rule, &json!({"text": "NDA"}), TS).unwrap_err();
        assert!(matches!(err, CoreError::EngineVersionMismatch(_)));
    }

    #[test]
    fn any_of_is_or_all_of_is_and() {
        let mut rule = nda_rule();
        rule.checks = vec![DslCheck {
            when: "true".to_string(),
            any_of: vec![
                "context.text contains 'NDA'".to_string(),
                "context.text contains 'non-disclosure'".to_string(),
            ],
            all_of: vec!["len(context.text) > 5".to_string()],
            produce: None,
        }];

        let hit = evaluate_rule(&rule, &json!({"text": "signed non-disclosure deed"}), TS).unwrap();
        assert_eq!(hit.len(), 1);

        // any_of satisfied but all_of fails on short text.
        let miss = evaluate_rule(&rule, &json!({"text": "NDA"}), TS).unwrap();
        assert!(miss.is_empty());

        // neither any_of alternative holds.
        let miss = evaluate_rule(&rule, &json!({"text": "plain services agreement"}), TS).unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn produce_merges_without_duplicates() {
        let mut rule = nda_rule();
        rule.checks[0].produce = Some(DslProduce {
            evidence: vec!["nda-marker".to_string(), "segment-scan".to_string()],
            citation: vec![],
            flags: vec!["review".to_string()],
        });
        let findings = evaluate_rule(&rule, &json!({"text": "NDA draft"}), TS).unwrap();
        assert_eq!(
            findings[0].evidence,
            vec!["nda-marker".to_string(), "segment-scan".to_string()]
        );
        assert_eq!(findings[0].flags, vec!["review".to_string()]);
    }

    #[test]
    fn malformed_expression_fails_even_after_a_satisfied_check() {
        let mut rule = nda_rule();
        rule.checks.push(DslCheck {
            when: "context.a BOGUS 'x'".to_string(),
            any_of: vec![],
            all_of: vec![],
            produce: None,
        });
        let err = evaluate_rule(&rule, &json!({"text": "NDA draft"}), TS).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedExpr(_)));
    }

    #[test]
    fn context_is_not_mutated() {
        let rule = nda_rule();
        let context = json!({"text": "NDA draft"});
        let before = context.clone();
        evaluate_rule(&rule, &context, TS).unwrap();
        assert_eq!(context, before);
    }
}

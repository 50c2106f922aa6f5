use crate::catalogue::source::{RuleFormat, RuleSource};
use crate::dsl::eval::{AppliesTo, DslRule};
use crate::error::{CoreError, CoreResult};
use crate::model::finding::{Severity, BASE_LOCALE};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A pattern rule file as authored. `id` may be empty when the file rides
/// along in a hybrid pair; discovery rejects id-less files standing alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub clause_type: Option<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub advice: String,
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

/// The resolved, compiled form the dispatcher and executors work with.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub clause_type: String,
    pub pack: String,
    pub severity: Severity,
    pub patterns: Vec<Regex>,
    pub advice: String,
    pub doc_types: Vec<String>,
    pub jurisdiction: Option<String>,
    pub requires_clause: Option<String>,
    pub applies_to_labels: Vec<String>,
    pub applies_to_segment_kind: Option<String>,
    pub channel: Option<String>,
    pub salience: u8,
    pub format: RuleFormat,
    pub dsl: Option<DslRule>,
    /// External handler path for hybrid delegation.
    pub delegate: Option<String>,
}

/// Compile one discovered source into a [`Rule`]. Errors here mean the
/// source is skipped by the loader, not that the load aborts.
pub fn compile(source: &RuleSource) -> CoreResult<Rule> {
    let pattern_file: Option<PatternFile> = match &source.pattern_path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Some(serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::RuleParse(format!("{}: {e}", path.display()))
            })?)
        }
        None => None,
    };
    let dsl_file: Option<DslRule> = match &source.dsl_path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            Some(serde_json::from_slice(&bytes).map_err(|e| {
                CoreError::RuleParse(format!("{}: {e}", path.display()))
            })?)
        }
        None => None,
    };

    if let Some(dsl) = &dsl_file {
        validate_locale_maps(dsl)?;
    }

    let severity_raw = dsl_file
        .as_ref()
        .map(|d| d.severity.as_str())
        .or_else(|| pattern_file.as_ref().map(|p| p.severity.as_str()))
        .unwrap_or("Medium");
    let severity: Severity = severity_raw
        .parse()
        .map_err(|_| CoreError::RuleParse(format!("{}: bad severity '{severity_raw}'", source.id)))?;

    let mut patterns = Vec::new();
    if let Some(p) = &pattern_file {
        for raw in &p.patterns {
            let re = Regex::new(raw).map_err(|e| {
                CoreError::RuleParse(format!("{}: bad pattern '{raw}': {e}", source.id))
            })?;
            patterns.push(re);
        }
    }

    let clause_type = pattern_file
        .as_ref()
        .and_then(|p| p.clause_type.clone())
        .or_else(|| dsl_file.as_ref().and_then(|d| d.category.clone()))
        .unwrap_or_default();

    let applies_to = dsl_file
        .as_ref()
        .and_then(|d| d.applies_to.clone())
        .or_else(|| pattern_file.as_ref().and_then(|p| p.applies_to.clone()))
        .unwrap_or_default();

    let doc_types = {
        let from_dsl = dsl_file.as_ref().map(|d| d.doc_types.clone()).unwrap_or_default();
        if from_dsl.is_empty() {
            pattern_file.as_ref().map(|p| p.doc_types.clone()).unwrap_or_default()
        } else {
            from_dsl
        }
    };

    let salience_raw = dsl_file
        .as_ref()
        .and_then(|d| d.salience)
        .or_else(|| pattern_file.as_ref().and_then(|p| p.salience));

    Ok(Rule {
        id: source.id.clone(),
        clause_type,
        pack: source.pack.clone(),
        severity,
        patterns,
        advice: pattern_file.as_ref().map(|p| p.advice.clone()).unwrap_or_default(),
        doc_types,
        jurisdiction: dsl_file
            .as_ref()
            .and_then(|d| d.jurisdiction.clone())
            .or_else(|| pattern_file.as_ref().and_then(|p| p.jurisdiction.clone())),
        requires_clause: dsl_file
            .as_ref()
            .and_then(|d| d.requires_clause.clone())
            .or_else(|| pattern_file.as_ref().and_then(|p| p.requires_clause.clone())),
        applies_to_labels: applies_to.labels,
        applies_to_segment_kind: applies_to.segment_kind,
        channel: dsl_file
            .as_ref()
            .and_then(|d| d.channel.clone())
            .or_else(|| pattern_file.as_ref().and_then(|p| p.channel.clone())),
        salience: salience_raw.unwrap_or(50).clamp(0, 100) as u8,
        format: source.format,
        delegate: dsl_file.as_ref().and_then(|d| d.python.clone()),
        dsl: dsl_file,
    })
}

/// Non-empty locale maps must carry the base locale; rules with checks need
/// at least a base-locale title and message to emit findings from.
fn validate_locale_maps(dsl: &DslRule) -> CoreResult<()> {
    let maps = [
        ("title", &dsl.title),
        ("message", &dsl.message),
        ("explain", &dsl.explain),
        ("suggestion", &dsl.suggestion),
    ];
    for (name, map) in maps {
        if !map.is_empty() && !map.contains_key(BASE_LOCALE) {
            return Err(CoreError::RuleParse(format!(
                "{}: {name} lacks base locale '{BASE_LOCALE}'",
                dsl.id
            )));
        }
    }
    if !dsl.checks.is_empty()
        && (!dsl.title.contains_key(BASE_LOCALE) || !dsl.message.contains_key(BASE_LOCALE))
    {
        return Err(CoreError::RuleParse(format!(
            "{}: rules with checks need base-locale title and message",
            dsl.id
        )));
    }
    Ok(())
}

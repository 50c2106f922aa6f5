use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Locale-keyed text. Every map on a localized finding must contain
/// [`BASE_LOCALE`].
pub type LocaleMap = BTreeMap<String, String>;

pub const BASE_LOCALE: &str = "en";

/// Catalogue-level severity. Variant order gives `Low < Medium < High <
/// Critical`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(CoreError::InvalidInput(format!(
                "unknown severity '{other}'"
            ))),
        }
    }
}

/// Finding-level severity. Findings never expose `Critical`; catalogue
/// `Critical` collapses to `High` at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingSeverity {
    Low,
    Medium,
    High,
}

impl From<Severity> for FindingSeverity {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Low => FindingSeverity::Low,
            Severity::Medium => FindingSeverity::Medium,
            Severity::High | Severity::Critical => FindingSeverity::High,
        }
    }
}

/// Pattern-era finding. Single message string, no locale dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub evidence: Vec<String>,
    pub citations: Vec<String>,
}

/// Localized finding. Immutable once constructed; `created_at` is supplied
/// by the caller so repeated runs over the same input stay byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub rule_id: String,
    pub title: LocaleMap,
    pub message: LocaleMap,
    pub explain: LocaleMap,
    pub suggestion: LocaleMap,
    pub severity: FindingSeverity,
    pub evidence: Vec<String>,
    pub citation: Vec<String>,
    pub flags: Vec<String>,
    pub version: String,
    pub engine_version: String,
    pub created_at: String,
}

fn base_only(text: &str) -> LocaleMap {
    let mut m = LocaleMap::new();
    m.insert(BASE_LOCALE.to_string(), text.to_string());
    m
}

impl Finding {
    /// Synthetic finding reporting an execution failure to the caller.
    /// Used by the legacy bridge as the single error-to-finding conversion.
    pub fn system(message: &str, engine_version: &str, ts_utc: &str) -> Finding {
        Finding {
            rule_id: "System".to_string(),
            title: base_only("Rule execution failed"),
            message: base_only(message),
            explain: LocaleMap::new(),
            suggestion: LocaleMap::new(),
            severity: FindingSeverity::High,
            evidence: Vec::new(),
            citation: Vec::new(),
            flags: vec!["system".to_string()],
            version: "1".to_string(),
            engine_version: engine_version.to_string(),
            created_at: ts_utc.to_string(),
        }
    }

    /// Lift a pattern-era finding into the localized shape. The single
    /// message lands under the base locale.
    pub fn from_legacy(legacy: &LegacyFinding, engine_version: &str, ts_utc: &str) -> Finding {
        Finding {
            rule_id: legacy.rule_id.clone(),
            title: base_only(&legacy.rule_id),
            message: base_only(&legacy.message),
            explain: LocaleMap::new(),
            suggestion: LocaleMap::new(),
            severity: FindingSeverity::from(legacy.severity),
            evidence: legacy.evidence.clone(),
            citation: legacy.citations.clone(),
            flags: Vec::new(),
            version: "1".to_string(),
            engine_version: engine_version.to_string(),
            created_at: ts_utc.to_string(),
        }
    }

    /// Text for `locale`, falling back to the base locale.
    pub fn message_for(&self, locale: &str) -> Option<&str> {
        localized(&self.message, locale)
    }
}

/// Lookup with base-locale fallback. Returns `None` only when the map lacks
/// the base locale as well.
pub fn localized<'a>(map: &'a LocaleMap, locale: &str) -> Option<&'a str> {
    map.get(locale)
        .or_else(|| map.get(BASE_LOCALE))
        .map(|s| s.as_str())
}

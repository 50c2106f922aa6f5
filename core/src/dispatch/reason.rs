use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Pattern,
    Keyword,
}

/// A pattern or keyword hit. Offsets index the normalized document text;
/// the matched substring is never carried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PatternEvidence {
    pub kind: PatternKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountEvidence {
    pub currency: String,
    pub value: f64,
    pub start: usize,
    pub end: usize,
}

// Manual ordering so the float value participates in the canonical
// identity tuple (total_cmp gives a total order).
impl Ord for AmountEvidence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.currency
            .cmp(&other.currency)
            .then_with(|| self.value.total_cmp(&other.value))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl PartialOrd for AmountEvidence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AmountEvidence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AmountEvidence {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationEvidence {
    pub unit: String,
    pub value: i64,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct CodeEvidence {
    pub code: String,
    pub start: usize,
    pub end: usize,
}

/// Structured evidence for one way a rule was proposed. Equality and
/// ordering run over the full field tuple, so identical evidence reached
/// via two dispatch paths collapses to a single reason and reason sets
/// sort canonically.
#[derive(
    Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct ReasonPayload {
    pub labels: BTreeSet<String>,
    pub patterns: Vec<PatternEvidence>,
    pub gates: BTreeMap<String, bool>,
    pub amounts: Vec<AmountEvidence>,
    pub durations: Vec<DurationEvidence>,
    pub law: Vec<CodeEvidence>,
    pub jurisdiction: Vec<CodeEvidence>,
}

/// A rule proposed for one segment, with every reason that proposed it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub rule_id: String,
    pub reasons: Vec<ReasonPayload>,
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A monetary amount found in a segment. Offsets index the normalized text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmountEntity {
    pub currency: String,
    pub value: f64,
    pub start: usize,
    pub end: usize,
}

/// A duration found in a segment ("60 days", "2 months").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationEntity {
    pub unit: String,
    pub value: i64,
    pub start: usize,
    pub end: usize,
}

/// A governing-law or jurisdiction signal, carried as a normalized code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LawSignal {
    pub code: String,
    pub start: usize,
    pub end: usize,
}

/// A free-form entity from the upstream extractors, keyed by type in
/// [`FeatureSet::entities`]. Labels are category names, never document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpanEntity {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Everything the upstream feature extractors produced for one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureSet {
    pub segment_id: String,
    pub labels: Vec<String>,
    pub amounts: Vec<AmountEntity>,
    pub durations: Vec<DurationEntity>,
    pub law_signals: Vec<LawSignal>,
    pub jurisdiction_signals: Vec<LawSignal>,
    pub entities: BTreeMap<String, Vec<SpanEntity>>,
}

/// A contracting party as normalized by the upstream extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub name: String,
    pub company_number: Option<String>,
    pub role: Option<String>,
}

/// A signature block reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub party_name: String,
    pub signatory: Option<String>,
    pub date: Option<String>,
}

/// Whole-document signals from the excluded document-type/summary
/// extractors, consumed as-is by graph construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocFeatures {
    pub doc_type: Option<String>,
    pub language: Option<String>,
    pub parties: Vec<Party>,
    pub signatures: Vec<Signature>,
    pub doc_flags: BTreeMap<String, bool>,
}

/// A drafting proposal produced by the excluded LLM orchestration layer.
/// Consumed only by the trace builder, which redacts `text` to hash + length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftProposal {
    pub rule_id: String,
    pub segment_id: String,
    pub kind: String,
    pub text: String,
    pub locale: String,
}

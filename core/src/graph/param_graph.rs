use crate::model::features::{Party, Signature};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DurationKind {
    Calendar,
    Business,
}

/// A normalized duration. Weeks/months/years collapse to days at
/// extraction time (7/30/365).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationValue {
    pub days: i64,
    pub kind: DurationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Money {
    pub amount: f64,
    /// ISO-4217 code.
    pub currency: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TriState {
    Present,
    Absent,
    #[default]
    Unknown,
}

/// Where a graph value came from: the clause, optionally the exact span
/// (offsets into normalized text, never the substring).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    pub clause_id: String,
    pub span: Option<(usize, usize)>,
    pub note: Option<String>,
}

/// Normalized whole-document parameter representation with provenance.
/// Every non-empty field with a known origin has a `sources` entry keyed
/// by the field name; derived fields (numbering, undefined terms) have
/// none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParamGraph {
    pub payment_term: Option<DurationValue>,
    pub contract_term: Option<DurationValue>,
    pub grace_period: Option<DurationValue>,
    pub notice_period: Option<DurationValue>,
    pub cure_period: Option<DurationValue>,
    pub governing_law: Option<String>,
    pub jurisdiction: Option<String>,
    pub cap: Option<Money>,
    pub contract_currency: Option<String>,
    pub survival_items: BTreeSet<String>,
    pub cross_refs: BTreeSet<(String, String)>,
    /// Every clause number seen in the document, so reference checks stay
    /// pure functions of the graph.
    pub clause_numbers: BTreeSet<String>,
    pub parties: Vec<Party>,
    pub signatures: Vec<Signature>,
    pub annex_refs: BTreeSet<String>,
    pub order_of_precedence: TriState,
    pub undefined_terms: BTreeSet<String>,
    pub numbering_gaps: Vec<String>,
    pub doc_flags: BTreeMap<String, bool>,
    pub sources: BTreeMap<String, SourceRef>,
}

impl ParamGraph {
    pub fn set_source(&mut self, field: &str, clause_id: &str, span: Option<(usize, usize)>) {
        self.sources.insert(
            field.to_string(),
            SourceRef {
                clause_id: clause_id.to_string(),
                span,
                note: None,
            },
        );
    }

    pub fn source_clause(&self, field: &str) -> Option<&str> {
        self.sources.get(field).map(|s| s.clause_id.as_str())
    }
}

//! Static dispatch tables. Labels come from the upstream classifiers in
//! normalized snake_case; both tables are additive hints, never filters.

/// Clause types a label maps into (drives the clause-type index).
pub fn clause_types_for_label(label: &str) -> &'static [&'static str] {
    match label {
        "payment" | "payment_terms" | "fees" => &["payment", "payment_terms", "fees"],
        "confidentiality" | "nda" => &["confidentiality", "non_disclosure"],
        "termination" => &["termination", "term_and_termination"],
        "term" => &["term", "term_and_termination"],
        "liability" | "limitation_of_liability" => &["liability", "limitation_of_liability"],
        "indemnity" | "indemnification" => &["indemnification"],
        "governing_law" | "law" => &["governing_law"],
        "jurisdiction" | "dispute_resolution" => &["jurisdiction", "dispute_resolution"],
        "notice" | "notices" => &["notices"],
        "ip" | "intellectual_property" => &["intellectual_property", "licence"],
        "data_protection" | "privacy" => &["data_protection"],
        "warranty" | "warranties" => &["warranties"],
        "assignment" => &["assignment"],
        "force_majeure" => &["force_majeure"],
        "insurance" => &["insurance"],
        "audit" => &["audit"],
        "survival" => &["survival"],
        "severability" => &["severability"],
        "non_compete" | "restrictive_covenants" => &["restrictive_covenants"],
        _ => &[],
    }
}

/// Keywords a label maps into (drives the token index).
pub fn keywords_for_label(label: &str) -> &'static [&'static str] {
    match label {
        "payment" | "payment_terms" | "fees" => &["payment", "fee", "invoice", "charge"],
        "confidentiality" | "nda" => &["confidential", "disclosure", "nda"],
        "termination" => &["termination", "terminate", "breach"],
        "term" => &["term", "renewal", "expiry"],
        "liability" | "limitation_of_liability" => &["liability", "damages", "cap"],
        "indemnity" | "indemnification" => &["indemnify", "indemnity", "defend"],
        "governing_law" | "law" => &["governing", "law"],
        "jurisdiction" | "dispute_resolution" => &["jurisdiction", "court", "arbitration"],
        "notice" | "notices" => &["notice", "notify"],
        "ip" | "intellectual_property" => &["intellectual", "copyright", "licence"],
        "data_protection" | "privacy" => &["data", "gdpr", "processor"],
        "warranty" | "warranties" => &["warranty", "warrant", "represent"],
        "assignment" => &["assign", "assignment", "novation"],
        "force_majeure" => &["force", "majeure"],
        "insurance" => &["insurance", "insurer", "policy"],
        "audit" => &["audit", "inspect", "records"],
        "survival" => &["survive", "survival"],
        "severability" => &["severability", "unenforceable"],
        "non_compete" | "restrictive_covenants" => &["compete", "solicit", "covenant"],
        _ => &[],
    }
}

/// Anchor tokens typed entities fan out through.
pub const AMOUNT_ANCHORS: &[&str] = &["amount", "fee", "charge"];
pub const DURATION_ANCHORS: &[&str] = &["term", "period", "notice"];
pub const LAW_ANCHORS: &[&str] = &["law", "governing"];
pub const JURISDICTION_ANCHORS: &[&str] = &["jurisdiction", "court", "venue"];

/// Tokens from segment text allowed to hit the token index directly.
/// Everything else is treated as incidental prose.
pub fn is_legal_token(token: &str) -> bool {
    matches!(
        token,
        "indemnify"
            | "indemnity"
            | "indemnification"
            | "liability"
            | "liable"
            | "damages"
            | "negligence"
            | "confidential"
            | "confidentiality"
            | "disclosure"
            | "nda"
            | "terminate"
            | "termination"
            | "breach"
            | "warranty"
            | "warrant"
            | "warranties"
            | "assignment"
            | "novation"
            | "jurisdiction"
            | "arbitration"
            | "governing"
            | "notice"
            | "notices"
            | "payment"
            | "invoice"
            | "fee"
            | "fees"
            | "charge"
            | "interest"
            | "survival"
            | "survive"
            | "severability"
            | "waiver"
            | "injunction"
            | "gdpr"
            | "audit"
            | "insurance"
            | "majeure"
            | "renewal"
            | "expiry"
            | "cure"
            | "grace"
            | "cap"
            | "licence"
            | "license"
            | "copyright"
            | "covenant"
            | "solicit"
    )
}

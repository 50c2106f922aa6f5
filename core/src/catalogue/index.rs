use crate::catalogue::rule::Rule;
use std::collections::{BTreeMap, BTreeSet};

/// Lowercase snake_case form used for label-set union, table lookup, and
/// clause-type index keys.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::new();
    let mut gap = false;
    for c in label.chars() {
        if c.is_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        } else {
            gap = true;
        }
    }
    out
}

/// Lowercase alphanumeric runs of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                current.push(lc);
            }
        } else if !current.is_empty() {
            if current.chars().count() >= 2 {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.chars().count() >= 2 {
        tokens.push(current);
    }
    tokens
}

/// The three lookup indices, computed once per catalogue load.
#[derive(Debug, Clone, Default)]
pub struct CatalogueIndex {
    pub token: BTreeMap<String, BTreeSet<String>>,
    pub clause_type: BTreeMap<String, BTreeSet<String>>,
    pub jurisdiction: BTreeMap<String, BTreeSet<String>>,
}

impl CatalogueIndex {
    pub fn build(rules: &BTreeMap<String, Rule>) -> Self {
        let mut index = CatalogueIndex::default();
        for (id, rule) in rules {
            let mut text = String::new();
            for piece in [&rule.id, &rule.clause_type, &rule.pack, &rule.advice] {
                text.push_str(piece);
                text.push(' ');
            }
            if let Some(dsl) = &rule.dsl {
                for map in [&dsl.title, &dsl.message] {
                    for v in map.values() {
                        text.push_str(v);
                        text.push(' ');
                    }
                }
            }
            for token in tokenize(&text) {
                index.token.entry(token).or_default().insert(id.clone());
            }

            let type_key = normalize_label(&rule.clause_type);
            if !type_key.is_empty() {
                index
                    .clause_type
                    .entry(type_key)
                    .or_default()
                    .insert(id.clone());
            }
            if let Some(j) = &rule.jurisdiction {
                index
                    .jurisdiction
                    .entry(j.to_lowercase())
                    .or_default()
                    .insert(id.clone());
            }
        }
        index
    }

    pub fn rules_for_token(&self, token: &str) -> impl Iterator<Item = &String> {
        self.token.get(token).into_iter().flatten()
    }

    /// Lookup by clause type, tolerant of case and separator spelling on
    /// either side (`"Bespoke Clause"` finds a rule declaring
    /// `"bespoke_clause"`).
    pub fn rules_for_clause_type(&self, clause_type: &str) -> impl Iterator<Item = &String> {
        self.clause_type
            .get(&normalize_label(clause_type))
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("Payment-Terms (60 days)!"),
            vec!["payment", "terms", "60", "days"]
        );
    }

    #[test]
    fn tokenize_drops_single_characters() {
        assert_eq!(tokenize("a BB c dd"), vec!["bb", "dd"]);
    }

    #[test]
    fn normalize_label_collapses_separators_to_underscores() {
        assert_eq!(normalize_label("Bespoke  Clause"), "bespoke_clause");
        assert_eq!(normalize_label("payment-terms"), "payment_terms");
        assert_eq!(normalize_label("payment_terms"), "payment_terms");
    }

    #[test]
    fn clause_type_lookup_ignores_case_and_separator_spelling() {
        use crate::catalogue::source::RuleFormat;
        use crate::model::finding::Severity;

        let rule = Rule {
            id: "ODD-001".to_string(),
            clause_type: "bespoke_clause".to_string(),
            pack: "core".to_string(),
            severity: Severity::Medium,
            patterns: Vec::new(),
            advice: String::new(),
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
        };
        let rules = BTreeMap::from([("ODD-001".to_string(), rule)]);
        let index = CatalogueIndex::build(&rules);

        let hits: Vec<&String> = index.rules_for_clause_type("Bespoke Clause").collect();
        assert_eq!(hits, vec!["ODD-001"]);
        assert_eq!(index.rules_for_clause_type("bespoke_clause").count(), 1);
        assert_eq!(index.rules_for_clause_type("unrelated").count(), 0);
    }
}

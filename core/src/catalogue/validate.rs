use crate::catalogue::source::{discover, RuleSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One root's rendition of a contested rule id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictVariant {
    pub root_priority: usize,
    pub path: PathBuf,
    pub body_hash: String,
}

/// Same rule id under multiple roots with different content. The only
/// build-fatal catalogue condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateConflict {
    pub id: String,
    pub variants: Vec<ConflictVariant>,
}

/// Detect content-divergent duplicate rule ids across `roots`. Duplicates
/// with identical body hashes are allowed and not reported.
pub fn validate_roots(roots: &[PathBuf]) -> Vec<DuplicateConflict> {
    let report = discover(roots);
    let mut by_id: BTreeMap<String, Vec<&RuleSource>> = BTreeMap::new();
    for source in &report.sources {
        by_id.entry(source.id.clone()).or_default().push(source);
    }

    let mut conflicts = Vec::new();
    for (id, sources) in by_id {
        if sources.len() < 2 {
            continue;
        }
        let first_hash = &sources[0].body_hash;
        if sources.iter().all(|s| &s.body_hash == first_hash) {
            continue;
        }
        conflicts.push(DuplicateConflict {
            id,
            variants: sources
                .iter()
                .map(|s| ConflictVariant {
                    root_priority: s.root_priority,
                    path: s.primary_path().to_path_buf(),
                    body_hash: s.body_hash.clone(),
                })
                .collect(),
        });
    }
    conflicts
}

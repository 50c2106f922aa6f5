pub mod index;
pub mod rule;
pub mod source;
pub mod store;
pub mod validate;

use crate::catalogue::index::CatalogueIndex;
use crate::catalogue::rule::{compile, Rule};
use crate::catalogue::source::{discover, RuleSource, SkippedFile};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The read-only product of one catalogue load: compiled rules, their
/// sources, the lookup indices, and every skipped file.
#[derive(Debug, Clone, Default)]
pub struct CompiledCatalogue {
    pub rules: BTreeMap<String, Rule>,
    pub sources: BTreeMap<String, RuleSource>,
    pub index: CatalogueIndex,
    pub skipped: Vec<SkippedFile>,
}

/// Discover and compile every rule under `roots`. Total: malformed files
/// are skipped and recorded; duplicate ids across roots resolve to the
/// first configured root (root order is priority order).
pub fn load(roots: &[PathBuf]) -> CompiledCatalogue {
    let report = discover(roots);
    let mut skipped = report.skipped;
    let mut rules: BTreeMap<String, Rule> = BTreeMap::new();
    let mut sources: BTreeMap<String, RuleSource> = BTreeMap::new();

    for source in report.sources {
        if let Some(winner) = sources.get(&source.id) {
            debug!(
                id = %source.id,
                kept_root = winner.root_priority,
                shadowed_root = source.root_priority,
                "duplicate rule id resolved by root priority"
            );
            continue;
        }
        match compile(&source) {
            Ok(rule) => {
                rules.insert(source.id.clone(), rule);
                sources.insert(source.id.clone(), source);
            }
            Err(e) => {
                let path = source.primary_path().to_path_buf();
                warn!(path = %path.display(), "skipping rule: {e}");
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    let index = CatalogueIndex::build(&rules);
    info!(
        rules = rules.len(),
        skipped = skipped.len(),
        "rule catalogue compiled"
    );
    CompiledCatalogue {
        rules,
        sources,
        index,
        skipped,
    }
}

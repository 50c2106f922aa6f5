use crate::catalogue::{load, CompiledCatalogue};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

pub const RULE_ROOTS_ENV: &str = "CLAUSELENS_RULE_ROOTS";

/// Owned handle over the compiled catalogue. Built once at startup and
/// passed by reference into dispatch and evaluation; `reload` builds a
/// fresh catalogue outside the lock and publishes it with one swap, so
/// in-flight readers keep their snapshot and are never raced.
pub struct RuleStore {
    roots: Vec<PathBuf>,
    inner: RwLock<Arc<CompiledCatalogue>>,
}

impl RuleStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let catalogue = Arc::new(load(&roots));
        Self {
            roots,
            inner: RwLock::new(catalogue),
        }
    }

    /// Roots from `CLAUSELENS_RULE_ROOTS` (path-separator-delimited, in
    /// priority order). Unset or empty yields an empty catalogue.
    pub fn from_env() -> Self {
        let roots = match std::env::var(RULE_ROOTS_ENV) {
            Ok(raw) => std::env::split_paths(&raw).collect(),
            Err(_) => Vec::new(),
        };
        Self::new(roots)
    }

    /// Current catalogue snapshot. Safe to hold across a reload.
    pub fn snapshot(&self) -> Arc<CompiledCatalogue> {
        self.inner.read().unwrap().clone()
    }

    /// Rebuild from the configured roots and atomically publish.
    pub fn reload(&self) {
        let fresh = Arc::new(load(&self.roots));
        *self.inner.write().unwrap() = fresh;
        info!("rule catalogue reloaded");
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

use crate::dispatch::env_usize;

/// Size ceilings for trace artifacts. Caps bound builder work and output
/// size regardless of document size; truncation always happens after
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceCaps {
    pub max_labels: usize,
    pub max_entities: usize,
    pub max_candidates: usize,
    pub max_reasons: usize,
    pub max_offsets: usize,
}

impl Default for TraceCaps {
    fn default() -> Self {
        Self {
            max_labels: 16,
            max_entities: 20,
            max_candidates: 50,
            max_reasons: 12,
            max_offsets: 4,
        }
    }
}

impl TraceCaps {
    /// `CLAUSELENS_TRACE_MAX_{LABELS,ENTITIES,CANDIDATES,REASONS,OFFSETS}`;
    /// malformed or unset values keep the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_labels: env_usize("CLAUSELENS_TRACE_MAX_LABELS", d.max_labels),
            max_entities: env_usize("CLAUSELENS_TRACE_MAX_ENTITIES", d.max_entities),
            max_candidates: env_usize("CLAUSELENS_TRACE_MAX_CANDIDATES", d.max_candidates),
            max_reasons: env_usize("CLAUSELENS_TRACE_MAX_REASONS", d.max_reasons),
            max_offsets: env_usize("CLAUSELENS_TRACE_MAX_OFFSETS", d.max_offsets),
        }
    }
}

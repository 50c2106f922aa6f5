pub mod reason;
pub mod select;
pub mod tables;

/// Output bounds for one dispatch call, applied after ordering so
/// truncation is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchCaps {
    pub max_candidates: usize,
    pub max_reasons: usize,
}

impl Default for DispatchCaps {
    fn default() -> Self {
        Self {
            max_candidates: 50,
            max_reasons: 12,
        }
    }
}

impl DispatchCaps {
    /// `CLAUSELENS_MAX_CANDIDATES` / `CLAUSELENS_MAX_REASONS`; malformed or
    /// unset values keep the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_candidates: env_usize("CLAUSELENS_MAX_CANDIDATES", d.max_candidates),
            max_reasons: env_usize("CLAUSELENS_MAX_REASONS", d.max_reasons),
        }
    }
}

pub(crate) fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

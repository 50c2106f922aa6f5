use crate::error::{CoreError, CoreResult};
use sha2::{Digest, Sha256};
use ulid::Ulid;

/// SHA-256 hash of bytes as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// 8-hex content hash used in trace evidence in place of raw text.
pub fn short_hash8(bytes: &[u8]) -> String {
    sha256_hex(bytes)[..8].to_string()
}

/// Deterministic trace id derived from a content fingerprint.
///
/// Used when the caller already has a request fingerprint and wants the same
/// inputs to produce the same trace id on every run.
pub fn trace_id_from_fingerprint_hex32(fingerprint_hex: &str) -> CoreResult<String> {
    let hex = fingerprint_hex.trim();
    if hex.len() < 32 || !hex.chars().take(32).all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidInput(
            "trace fingerprint must be hex with length >= 32".to_string(),
        ));
    }
    Ok(format!("t_{}", hex[..32].to_ascii_lowercase()))
}

/// Random trace id for callers without a fingerprint.
pub fn trace_id_ulid() -> String {
    format!("t_{}", Ulid::new())
}

//! Stable hashing for sweep plans and reports.

use serde::Serialize;
use sha2::{Digest, Sha256};

use veil_core::errors::{ErrorInfo, VeilError};

/// Computes a stable hexadecimal hash for the provided serializable payload.
///
/// Struct fields serialize in declaration order and all map types used in
/// plans are ordered, so equal plans hash equally across runs and platforms.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, VeilError> {
    let bytes = serde_json::to_vec(value).map_err(|err| {
        VeilError::Serde(
            ErrorInfo::new("hash-encode", "failed to encode payload for hashing")
                .with_context("cause", err.to_string()),
        )
    })?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_payloads_hash_equally() {
        let a = stable_hash_string(&("plan", 3u32)).unwrap();
        let b = stable_hash_string(&("plan", 3u32)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn different_payloads_diverge() {
        let a = stable_hash_string(&("plan", 3u32)).unwrap();
        let b = stable_hash_string(&("plan", 4u32)).unwrap();
        assert_ne!(a, b);
    }
}

use crate::app_error::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub fn blake3_hex_prefixed(bytes: &[u8]) -> String {
    format!("blake3:{}", blake3::hash(bytes).to_hex())
}

/// Hashes the raw bytes on disk. Content is never re-canonicalized first.
pub fn hash_file(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path).map_err(|e| AppError::io("hash", "failed reading file to hash", path, &e))?;
    Ok(blake3_hex_prefixed(&bytes))
}

pub fn validate_blake3_prefixed(s: &str) -> AppResult<()> {
    let Some(hex) = s.strip_prefix("blake3:") else {
        return Err(AppError::new(
            "BP_HASH_INVALID_FORMAT",
            "hash",
            "hash must start with blake3:",
            false,
            serde_json::json!({ "value": s }),
        ));
    };
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
        return Err(AppError::new(
            "BP_HASH_DECODE_FAILED",
            "hash",
            "invalid lowercase hex digest",
            false,
            serde_json::json!({ "value": s }),
        ));
    }
    Ok(())
}

/// SHA-256 of a public key, rendered as eight colon-separated groups of hex.
pub fn key_fingerprint(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    hex.as_bytes()
        .chunks(8)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

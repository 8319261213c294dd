use crate::app_error::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

pub const ED25519_ALGORITHM: &str = "Ed25519";

/// Signature stored next to its document, never inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetachedSignature {
    pub algorithm: String,
    pub key_id: String,
    pub signature_base64: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SigningKeyMaterial {
    pub key_id: String,
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for SigningKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyMaterial")
            .field("key_id", &self.key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyMaterial {
    pub key_id: String,
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SigningKeyPair {
    pub signing_key: SigningKeyMaterial,
    pub public_key: PublicKeyMaterial,
}

/// The only two operations the document store needs from a signature scheme.
pub trait SignatureService: Send + Sync {
    fn sign(&self, payload: &[u8], key: &SigningKeyMaterial) -> AppResult<DetachedSignature>;

    /// A failed verification is a normal outcome, so this never errors.
    fn verify(&self, payload: &[u8], signature: &DetachedSignature, key: &PublicKeyMaterial) -> bool;
}

fn signature_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "signature", message, false, details)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519SignatureService;

impl SignatureService for Ed25519SignatureService {
    fn sign(&self, payload: &[u8], key: &SigningKeyMaterial) -> AppResult<DetachedSignature> {
        if key.key_id.trim().is_empty() {
            return Err(signature_error(
                "BP_SIGNING_KEY_INVALID",
                "signing key id is required",
                serde_json::json!({}),
            ));
        }
        let seed: [u8; 32] = key.private_key.as_slice().try_into().map_err(|_| {
            signature_error(
                "BP_SIGNING_KEY_INVALID",
                "ed25519 private key must be 32 bytes",
                serde_json::json!({ "key_id": key.key_id, "len": key.private_key.len() }),
            )
        })?;
        let signing_key = SigningKey::from_bytes(&seed);
        let signature = signing_key.sign(payload);
        Ok(DetachedSignature {
            algorithm: ED25519_ALGORITHM.to_string(),
            key_id: key.key_id.clone(),
            signature_base64: BASE64.encode(signature.to_bytes()),
        })
    }

    fn verify(&self, payload: &[u8], signature: &DetachedSignature, key: &PublicKeyMaterial) -> bool {
        if signature.algorithm != ED25519_ALGORITHM || signature.key_id != key.key_id {
            return false;
        }
        let Ok(public_key_bytes) = <[u8; 32]>::try_from(key.public_key.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key_bytes) else {
            return false;
        };
        let Ok(signature_bytes) = BASE64.decode(&signature.signature_base64) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };
        verifying_key.verify_strict(payload, &signature).is_ok()
    }
}

pub fn generate_key_pair(key_id: &str) -> AppResult<SigningKeyPair> {
    let mut seed = [0u8; 32];
    getrandom::fill(&mut seed).map_err(|e| {
        signature_error(
            "BP_KEYGEN_FAILED",
            "failed generating signing key entropy",
            serde_json::json!({ "error": e.to_string() }),
        )
    })?;
    let signing_key = SigningKey::from_bytes(&seed);
    let public_key = signing_key.verifying_key().to_bytes();

    Ok(SigningKeyPair {
        signing_key: SigningKeyMaterial {
            key_id: key_id.to_string(),
            private_key: seed.to_vec(),
        },
        public_key: PublicKeyMaterial {
            key_id: key_id.to_string(),
            public_key: public_key.to_vec(),
        },
    })
}

pub fn encode_public_key(public_key: &[u8]) -> String {
    BASE64.encode(public_key)
}

pub fn decode_public_key(key_id: &str, encoded: &str) -> AppResult<PublicKeyMaterial> {
    let public_key = BASE64.decode(encoded).map_err(|e| {
        signature_error(
            "BP_PUBLIC_KEY_INVALID",
            "public key is not valid base64",
            serde_json::json!({ "error": e.to_string(), "key_id": key_id }),
        )
    })?;
    Ok(PublicKeyMaterial {
        key_id: key_id.to_string(),
        public_key,
    })
}

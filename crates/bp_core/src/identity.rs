use crate::app_error::{AppError, AppResult};
use crate::signature::{
    decode_public_key, encode_public_key, generate_key_pair, PublicKeyMaterial, SigningKeyMaterial,
};
use crate::types::UserId;
use crate::workspace::validate_path_segment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

const PROFILE_FILE_NAME: &str = "identity.json";
const PRIVATE_KEY_FILE_NAME: &str = "private.key.protected";

/// Wraps private key bytes at rest. Platform keychains plug in here.
pub trait PrivateKeyProtector {
    fn provider_name(&self) -> &str;
    fn protect(&self, private_key: &[u8]) -> AppResult<Vec<u8>>;
    fn unprotect(&self, protected: &[u8]) -> AppResult<Vec<u8>>;
}

/// Stores the key bytes unchanged. Relies on file permissions alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFileKeyProtector;

impl PrivateKeyProtector for PlainFileKeyProtector {
    fn provider_name(&self) -> &str {
        "plain-file"
    }

    fn protect(&self, private_key: &[u8]) -> AppResult<Vec<u8>> {
        Ok(private_key.to_vec())
    }

    fn unprotect(&self, protected: &[u8]) -> AppResult<Vec<u8>> {
        Ok(protected.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub key_id: String,
    pub public_key_base64: String,
    pub key_storage_provider: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone)]
pub struct StoredIdentity {
    pub profile: IdentityProfile,
    pub signing_key: SigningKeyMaterial,
    pub public_key: PublicKeyMaterial,
}

fn identity_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "identity", message, false, details)
}

fn identity_dir(root: &Path, user_id: &str) -> PathBuf {
    root.join(user_id)
}

pub fn create_identity(
    root: &Path,
    display_name: &str,
    protector: &dyn PrivateKeyProtector,
    now_ms: i64,
) -> AppResult<StoredIdentity> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(identity_error(
            "BP_IDENTITY_NAME_REQUIRED",
            "identity display name is required",
            serde_json::json!({}),
        ));
    }

    let user_id = UserId::generate();
    let pair = generate_key_pair(user_id.as_str())?;
    let profile = IdentityProfile {
        user_id: user_id.clone(),
        display_name: display_name.to_string(),
        key_id: pair.public_key.key_id.clone(),
        public_key_base64: encode_public_key(&pair.public_key.public_key),
        key_storage_provider: protector.provider_name().to_string(),
        created_at_ms: now_ms,
    };

    let dir = identity_dir(root, user_id.as_str());
    fs::create_dir_all(&dir).map_err(|e| AppError::io("identity", "failed creating identity directory", &dir, &e))?;
    let profile_bytes = serde_json::to_vec_pretty(&profile).map_err(|e| {
        identity_error(
            "BP_IDENTITY_ENCODE_FAILED",
            "failed serializing identity profile",
            serde_json::json!({ "error": e.to_string() }),
        )
    })?;
    let profile_path = dir.join(PROFILE_FILE_NAME);
    fs::write(&profile_path, profile_bytes)
        .map_err(|e| AppError::io("identity", "failed writing identity profile", &profile_path, &e))?;
    let key_path = dir.join(PRIVATE_KEY_FILE_NAME);
    let protected = protector.protect(&pair.signing_key.private_key)?;
    fs::write(&key_path, protected)
        .map_err(|e| AppError::io("identity", "failed writing protected private key", &key_path, &e))?;

    info!(user_id = %user_id, provider = protector.provider_name(), "created identity");
    Ok(StoredIdentity {
        profile,
        signing_key: pair.signing_key,
        public_key: pair.public_key,
    })
}

fn read_profile(path: &Path) -> AppResult<IdentityProfile> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            identity_error(
                "BP_IDENTITY_NOT_FOUND",
                "identity profile was not found",
                serde_json::json!({ "path": path }),
            )
        } else {
            AppError::io("identity", "failed reading identity profile", path, &e)
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        identity_error(
            "BP_IDENTITY_INVALID",
            "identity profile could not be parsed",
            serde_json::json!({ "error": e.to_string(), "path": path }),
        )
    })
}

pub fn load_identity(
    root: &Path,
    user_id: &str,
    protector: &dyn PrivateKeyProtector,
) -> AppResult<StoredIdentity> {
    validate_path_segment(user_id)?;
    let dir = identity_dir(root, user_id);
    let profile = read_profile(&dir.join(PROFILE_FILE_NAME))?;

    let key_path = dir.join(PRIVATE_KEY_FILE_NAME);
    let protected = fs::read(&key_path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            identity_error(
                "BP_IDENTITY_KEY_MISSING",
                "protected private key was not found",
                serde_json::json!({ "path": key_path }),
            )
        } else {
            AppError::io("identity", "failed reading protected private key", &key_path, &e)
        }
    })?;
    let private_key = protector.unprotect(&protected)?;
    let public_key = decode_public_key(&profile.key_id, &profile.public_key_base64)?;

    Ok(StoredIdentity {
        signing_key: SigningKeyMaterial {
            key_id: profile.key_id.clone(),
            private_key,
        },
        public_key,
        profile,
    })
}

/// Profiles under `root`, oldest first. Directories without a profile are ignored.
pub fn list_identities(root: &Path) -> AppResult<Vec<IdentityProfile>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::io("identity", "failed listing identities", root, &e)),
    };

    let mut profiles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AppError::io("identity", "failed reading identity entry", root, &e))?;
        let profile_path = entry.path().join(PROFILE_FILE_NAME);
        if profile_path.is_file() {
            profiles.push(read_profile(&profile_path)?);
        }
    }
    profiles.sort_by(|a, b| {
        a.created_at_ms
            .cmp(&b.created_at_ms)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    Ok(profiles)
}

pub fn default_identity(
    root: &Path,
    display_name: &str,
    protector: &dyn PrivateKeyProtector,
    now_ms: i64,
) -> AppResult<StoredIdentity> {
    match list_identities(root)?.first() {
        Some(profile) => load_identity(root, profile.user_id.as_str(), protector),
        None => create_identity(root, display_name, protector, now_ms),
    }
}

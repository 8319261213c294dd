use crate::app_error::AppResult;
use crate::signature::{PublicKeyMaterial, SigningKeyMaterial};
use crate::signed_store::{SignedDocumentReadResult, SignedDocumentStore};
use crate::snapshot::ManifestEntry;
use crate::types::ProjectId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SYNC_MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncManifestDocument {
    pub schema_version: u32,
    pub project_id: ProjectId,
    pub manifest_version: u64,
    pub batch_id: String,
    pub created_at_ms: i64,
    pub entries: Vec<ManifestEntry>,
}

/// `<shared>/manifest/sync-manifest.json`, outside every exchange directory.
pub fn manifest_path(shared_root: &Path) -> PathBuf {
    shared_root.join("manifest").join("sync-manifest.json")
}

pub fn read_manifest(
    store: &SignedDocumentStore,
    shared_root: &Path,
    public_key: &PublicKeyMaterial,
) -> AppResult<SignedDocumentReadResult<SyncManifestDocument>> {
    store.read(&manifest_path(shared_root), public_key)
}

pub fn write_manifest(
    store: &SignedDocumentStore,
    shared_root: &Path,
    manifest: &SyncManifestDocument,
    signing_key: &SigningKeyMaterial,
) -> AppResult<()> {
    store.write(&manifest_path(shared_root), manifest, signing_key)?;
    Ok(())
}

/// Version the next publish builds on. A missing or untrusted manifest counts as 0.
pub fn current_manifest_version(
    store: &SignedDocumentStore,
    shared_root: &Path,
    public_key: &PublicKeyMaterial,
) -> AppResult<u64> {
    match read_manifest(store, shared_root, public_key) {
        Ok(read) if read.is_signature_valid => Ok(read.document.manifest_version),
        Ok(_) => Ok(0),
        Err(err) if err.is_not_found() => Ok(0),
        Err(err) => Err(err),
    }
}

use crate::app_error::{AppError, AppResult};
use crate::canon_json::{from_canonical_slice, to_canonical_vec};
use crate::signature::{
    DetachedSignature, Ed25519SignatureService, PublicKeyMaterial, SignatureService,
    SigningKeyMaterial,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SIGNATURE_EXTENSION: &str = "sig";

#[derive(Debug, Clone)]
pub struct SignedDocumentWriteResult {
    pub document_path: PathBuf,
    pub signature_path: PathBuf,
    pub canonical_bytes: Vec<u8>,
    pub signature: DetachedSignature,
}

#[derive(Debug, Clone)]
pub struct SignedDocumentReadResult<T> {
    pub document: T,
    pub canonical_bytes: Vec<u8>,
    pub signature: DetachedSignature,
    pub is_signature_valid: bool,
}

fn store_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "signed_store", message, false, details)
}

/// `project/project.json` pairs with `project/project.sig`.
pub fn signature_path_for(document_path: &Path) -> PathBuf {
    document_path.with_extension(SIGNATURE_EXTENSION)
}

/// Same 1:1 rule for `/`-separated relative paths kept in manifests.
pub fn signature_relpath_for(document_relpath: &str) -> String {
    let (dir, file) = match document_relpath.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, document_relpath),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{dir}/{stem}.{SIGNATURE_EXTENSION}"),
        None => format!("{stem}.{SIGNATURE_EXTENSION}"),
    }
}

pub(crate) fn ensure_parent_dir(path: &Path, category: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(category, "failed creating parent directory", parent, &e))?;
    }
    Ok(())
}

fn read_required(path: &Path, missing_code: &str, missing_message: &str) -> AppResult<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            store_error(missing_code, missing_message, serde_json::json!({ "path": path }))
        } else {
            AppError::io("signed_store", "failed reading signed document file", path, &e)
        }
    })
}

pub struct SignedDocumentStore {
    signatures: Box<dyn SignatureService>,
}

impl Default for SignedDocumentStore {
    fn default() -> Self {
        Self::new(Box::new(Ed25519SignatureService))
    }
}

impl SignedDocumentStore {
    pub fn new(signatures: Box<dyn SignatureService>) -> Self {
        Self { signatures }
    }

    pub fn write<T: Serialize>(
        &self,
        document_path: &Path,
        document: &T,
        signing_key: &SigningKeyMaterial,
    ) -> AppResult<SignedDocumentWriteResult> {
        let canonical_bytes = to_canonical_vec(document)?;
        let signature = self.signatures.sign(&canonical_bytes, signing_key)?;
        let signature_bytes = serde_json::to_vec(&signature).map_err(|e| {
            store_error(
                "BP_SIGNATURE_ENCODE_FAILED",
                "failed serializing detached signature",
                serde_json::json!({ "error": e.to_string() }),
            )
        })?;
        let signature_path = signature_path_for(document_path);

        ensure_parent_dir(document_path, "signed_store")?;
        fs::write(document_path, &canonical_bytes).map_err(|e| {
            AppError::io("signed_store", "failed writing document", document_path, &e)
        })?;
        fs::write(&signature_path, signature_bytes).map_err(|e| {
            AppError::io("signed_store", "failed writing detached signature", &signature_path, &e)
        })?;

        Ok(SignedDocumentWriteResult {
            document_path: document_path.to_path_buf(),
            signature_path,
            canonical_bytes,
            signature,
        })
    }

    /// Verification runs over the bytes read from disk, not a re-serialization,
    /// so a codec bug cannot mask tampering.
    pub fn read<T: DeserializeOwned>(
        &self,
        document_path: &Path,
        public_key: &PublicKeyMaterial,
    ) -> AppResult<SignedDocumentReadResult<T>> {
        let (canonical_bytes, signature) = self.read_pair(document_path)?;
        let document = from_canonical_slice::<T>(&canonical_bytes).map_err(|e| {
            store_error(
                "BP_DOCUMENT_INVALID",
                "signed document could not be deserialized",
                serde_json::json!({ "path": document_path, "error": e.details }),
            )
        })?;
        let is_signature_valid = self.signatures.verify(&canonical_bytes, &signature, public_key);

        Ok(SignedDocumentReadResult {
            document,
            canonical_bytes,
            signature,
            is_signature_valid,
        })
    }

    /// Checks the detached signature without interpreting the document.
    pub fn verify_file(&self, document_path: &Path, public_key: &PublicKeyMaterial) -> AppResult<bool> {
        let (bytes, signature) = self.read_pair(document_path)?;
        Ok(self.signatures.verify(&bytes, &signature, public_key))
    }

    fn read_pair(&self, document_path: &Path) -> AppResult<(Vec<u8>, DetachedSignature)> {
        let bytes = read_required(
            document_path,
            "BP_DOCUMENT_NOT_FOUND",
            "signed document does not exist",
        )?;
        let signature_path = signature_path_for(document_path);
        let signature_bytes = read_required(
            &signature_path,
            "BP_SIGNATURE_MISSING",
            "detached signature is missing for document",
        )?;
        let signature: DetachedSignature = serde_json::from_slice(&signature_bytes).map_err(|e| {
            store_error(
                "BP_SIGNATURE_INVALID_FORMAT",
                "detached signature could not be parsed",
                serde_json::json!({ "error": e.to_string(), "path": signature_path }),
            )
        })?;
        Ok((bytes, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_paths_replace_the_extension() {
        assert_eq!(
            signature_path_for(Path::new("root/project/project.json")),
            PathBuf::from("root/project/project.sig")
        );
        assert_eq!(
            signature_relpath_for("versions/abc/items/def.json"),
            "versions/abc/items/def.sig"
        );
        assert_eq!(signature_relpath_for("project.json"), "project.sig");
    }
}

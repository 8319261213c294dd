use crate::app_error::{AppError, AppResult};
use crate::hashing::hash_file;
use crate::signed_store::{signature_path_for, signature_relpath_for};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Subdirectories whose documents are exchanged between local and shared roots.
pub const EXCHANGE_DIRECTORIES: [&str; 3] = ["project", "versions", "log"];

/// Local-only settings never leave the machine they were written on.
pub const LOCAL_SETTINGS_FILE_NAME: &str = "settings.local.json";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub document_path: String,
    pub document_hash: String,
    pub signature_path: String,
    pub signature_hash: String,
}

fn snapshot_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "snapshot", message, false, details)
}

fn is_local_settings(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case(LOCAL_SETTINGS_FILE_NAME))
        .unwrap_or(false)
}

fn relpath(root: &Path, path: &Path) -> AppResult<String> {
    let rel = path.strip_prefix(root).map_err(|e| {
        snapshot_error(
            "BP_SNAPSHOT_PATH_INVALID",
            "document path is outside the workspace root",
            serde_json::json!({ "error": e.to_string(), "path": path, "root": root }),
        )
    })?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    Ok(parts.join("/"))
}

pub fn build_snapshot(root: &Path) -> AppResult<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for dir_name in EXCHANGE_DIRECTORIES {
        let dir = root.join(dir_name);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                snapshot_error(
                    "BP_SNAPSHOT_WALK_FAILED",
                    "failed walking workspace directory",
                    serde_json::json!({ "error": e.to_string(), "path": dir }),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|x| x.to_str()) != Some("json") || is_local_settings(path) {
                continue;
            }

            let signature_path = signature_path_for(path);
            if !signature_path.is_file() {
                return Err(snapshot_error(
                    "BP_SIGNATURE_MISSING",
                    "document has no detached signature",
                    serde_json::json!({ "path": path, "signature_path": signature_path }),
                ));
            }

            let document_path = relpath(root, path)?;
            entries.push(ManifestEntry {
                signature_path: signature_relpath_for(&document_path),
                document_hash: hash_file(path)?,
                signature_hash: hash_file(&signature_path)?,
                document_path,
            });
        }
    }

    entries.sort_by(|a, b| a.document_path.cmp(&b.document_path));
    debug!(root = %root.display(), entries = entries.len(), "built workspace snapshot");
    Ok(entries)
}

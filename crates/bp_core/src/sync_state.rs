use crate::app_error::{AppError, AppResult};
use crate::signed_store::ensure_parent_dir;
use crate::sync_analysis::SyncTrackedEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SYNC_STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStateDocument {
    pub schema_version: u32,
    pub last_pulled_manifest_version: u64,
    pub last_pushed_manifest_version: u64,
    pub last_trust_validated_at_ms: Option<i64>,
    pub known_remote_batch_ids: Vec<String>,
    pub unresolved_conflicts: Vec<String>,
    pub tracked_entries: Vec<SyncTrackedEntry>,
}

impl Default for SyncStateDocument {
    fn default() -> Self {
        Self {
            schema_version: SYNC_STATE_SCHEMA_VERSION,
            last_pulled_manifest_version: 0,
            last_pushed_manifest_version: 0,
            last_trust_validated_at_ms: None,
            known_remote_batch_ids: Vec::new(),
            unresolved_conflicts: Vec::new(),
            tracked_entries: Vec::new(),
        }
    }
}

impl SyncStateDocument {
    pub fn remember_batch(&mut self, batch_id: &str) {
        if !self.known_remote_batch_ids.iter().any(|b| b == batch_id) {
            self.known_remote_batch_ids.push(batch_id.to_string());
        }
    }
}

fn state_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "sync_state", message, false, details)
}

pub fn sync_state_path(local_root: &Path) -> PathBuf {
    local_root.join("sync").join("state.json")
}

pub fn load_sync_state(local_root: &Path) -> AppResult<SyncStateDocument> {
    let path = sync_state_path(local_root);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SyncStateDocument::default()),
        Err(e) => return Err(AppError::io("sync_state", "failed reading sync state", &path, &e)),
    };

    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        state_error(
            "BP_SYNC_STATE_INVALID",
            "sync state is not valid JSON",
            serde_json::json!({ "error": e.to_string(), "path": path }),
        )
    })?;
    let schema_version = value.get("schema_version").and_then(|v| v.as_u64());
    if schema_version != Some(u64::from(SYNC_STATE_SCHEMA_VERSION)) {
        return Err(state_error(
            "BP_SYNC_STATE_UNSUPPORTED_VERSION",
            "sync state schema version is not supported",
            serde_json::json!({ "path": path, "schema_version": schema_version }),
        ));
    }
    serde_json::from_value(value).map_err(|e| {
        state_error(
            "BP_SYNC_STATE_INVALID",
            "sync state does not match the expected shape",
            serde_json::json!({ "error": e.to_string(), "path": path }),
        )
    })
}

/// Replaces the state file in one rename so readers never see a partial write.
pub fn save_sync_state(local_root: &Path, state: &SyncStateDocument) -> AppResult<()> {
    let path = sync_state_path(local_root);
    ensure_parent_dir(&path, "sync_state")?;
    let bytes = serde_json::to_vec_pretty(state).map_err(|e| {
        state_error(
            "BP_SYNC_STATE_ENCODE_FAILED",
            "failed serializing sync state",
            serde_json::json!({ "error": e.to_string() }),
        )
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|e| AppError::io("sync_state", "failed writing sync state", &tmp, &e))?;
    fs::rename(&tmp, &path).map_err(|e| AppError::io("sync_state", "failed replacing sync state", &path, &e))
}

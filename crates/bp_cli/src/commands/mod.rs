pub mod identity;
pub mod sync;
pub mod trust;
pub mod workspace;

use bp_core::app_error::{AppError, AppResult};
use bp_core::config::{default_identity_root, load_settings, WorkspaceSettingsV1};
use bp_core::identity::{default_identity, load_identity, PlainFileKeyProtector, StoredIdentity};
use bp_core::signed_store::SignedDocumentStore;
use bp_core::trust::TrustState;
use bp_core::workspace::{load_workspace, ProjectWorkspaceSnapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};

const DEFAULT_DISPLAY_NAME: &str = "Local Admin";

/// A command that ran but did not complete its effect, such as a blocked sync.
/// `main` maps it to exit code 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Blocked,
}

pub fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before unix epoch");
    now.as_millis() as i64
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn identity_root(explicit: Option<&str>) -> PathBuf {
    explicit.map(PathBuf::from).unwrap_or_else(default_identity_root)
}

/// Settings are optional for a workspace that has never been initialized or pulled.
pub fn try_load_settings(local_root: &Path) -> AppResult<Option<WorkspaceSettingsV1>> {
    match load_settings(local_root) {
        Ok(settings) => Ok(Some(settings)),
        Err(err) if err.code == "BP_CONFIG_MISSING" => Ok(None),
        Err(err) => Err(err),
    }
}

/// The identity named in the workspace settings, else the earliest local identity.
pub fn resolve_identity(
    identity_root: &Path,
    settings: Option<&WorkspaceSettingsV1>,
    now_ms: i64,
) -> AppResult<StoredIdentity> {
    match settings.and_then(|s| s.identity_id.as_deref()) {
        Some(user_id) => load_identity(identity_root, user_id, &PlainFileKeyProtector),
        None => default_identity(identity_root, DEFAULT_DISPLAY_NAME, &PlainFileKeyProtector, now_ms),
    }
}

/// Loads the workspace for editing. Edits are refused unless every signature verifies.
pub fn open_trusted_workspace(
    store: &SignedDocumentStore,
    local_root: &Path,
    identity: &StoredIdentity,
    now_ms: i64,
) -> AppResult<ProjectWorkspaceSnapshot> {
    let loaded = load_workspace(store, local_root, &identity.public_key, now_ms);
    match (loaded.workspace, loaded.trust_report.state) {
        (Some(workspace), TrustState::Trusted) => Ok(workspace),
        (_, state) => Err(AppError::new(
            "BP_WORKSPACE_UNTRUSTED",
            "workspace",
            "workspace is not trusted and cannot be edited",
            false,
            serde_json::json!({
                "state": state.display_text(),
                "summary": loaded.trust_report.summary,
                "path": local_root,
            }),
        )),
    }
}

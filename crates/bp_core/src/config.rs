use crate::app_error::{AppError, AppResult};
use crate::signed_store::ensure_parent_dir;
use crate::snapshot::LOCAL_SETTINGS_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SHARED_ROOT_ENV: &str = "BP_SHARED_ROOT";
pub const IDENTITY_ROOT_ENV: &str = "BP_IDENTITY_ROOT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSettingsV1 {
    pub schema_version: u32,
    pub shared_root: String,
    pub identity_id: Option<String>,
}

impl WorkspaceSettingsV1 {
    pub fn new(shared_root: &Path, identity_id: Option<String>) -> Self {
        Self {
            schema_version: 1,
            shared_root: shared_root.to_string_lossy().into_owned(),
            identity_id,
        }
    }

    /// `BP_SHARED_ROOT` wins over the stored value when set and non-empty.
    pub fn effective_shared_root(&self) -> PathBuf {
        non_empty_path(std::env::var(SHARED_ROOT_ENV).ok().as_deref())
            .unwrap_or_else(|| PathBuf::from(&self.shared_root))
    }
}

fn non_empty_path(value: Option<&str>) -> Option<PathBuf> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn config_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "config", message, false, details)
}

pub fn settings_path(local_root: &Path) -> PathBuf {
    local_root.join("project").join(LOCAL_SETTINGS_FILE_NAME)
}

pub fn load_settings(local_root: &Path) -> AppResult<WorkspaceSettingsV1> {
    let path = settings_path(local_root);
    let bytes = fs::read(&path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            config_error(
                "BP_CONFIG_MISSING",
                "workspace settings file is missing",
                serde_json::json!({ "path": path }),
            )
        } else {
            AppError::io("config", "failed reading workspace settings", &path, &e)
        }
    })?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        config_error(
            "BP_CONFIG_INVALID",
            "workspace settings are not valid JSON",
            serde_json::json!({ "error": e.to_string(), "path": path }),
        )
    })?;

    match value.get("schema_version").and_then(|v| v.as_u64()) {
        Some(1) => serde_json::from_value(value).map_err(|e| {
            config_error(
                "BP_CONFIG_INVALID",
                "workspace settings do not match schema version 1",
                serde_json::json!({ "error": e.to_string(), "path": path }),
            )
        }),
        other => Err(config_error(
            "BP_CONFIG_UNSUPPORTED_VERSION",
            "workspace settings schema version is not supported",
            serde_json::json!({ "path": path, "schema_version": other }),
        )),
    }
}

pub fn save_settings(local_root: &Path, settings: &WorkspaceSettingsV1) -> AppResult<()> {
    let path = settings_path(local_root);
    ensure_parent_dir(&path, "config")?;
    let bytes = serde_json::to_vec_pretty(settings).map_err(|e| {
        config_error(
            "BP_CONFIG_ENCODE_FAILED",
            "failed serializing workspace settings",
            serde_json::json!({ "error": e.to_string() }),
        )
    })?;
    fs::write(&path, bytes).map_err(|e| AppError::io("config", "failed writing workspace settings", &path, &e))
}

/// Explicit argument, then `BP_SHARED_ROOT`, then the stored settings.
pub fn resolve_shared_root(
    explicit: Option<&Path>,
    settings: Option<&WorkspaceSettingsV1>,
) -> AppResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(settings) = settings {
        return Ok(settings.effective_shared_root());
    }
    non_empty_path(std::env::var(SHARED_ROOT_ENV).ok().as_deref()).ok_or_else(|| {
        config_error(
            "BP_CONFIG_MISSING",
            "no shared root configured for this workspace",
            serde_json::json!({ "env": SHARED_ROOT_ENV }),
        )
    })
}

/// `BP_IDENTITY_ROOT`, else `<home>/.blueprints/identities`, else a directory under the cwd.
pub fn default_identity_root() -> PathBuf {
    if let Some(root) = non_empty_path(std::env::var(IDENTITY_ROOT_ENV).ok().as_deref()) {
        return root;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".blueprints")
        .join("identities")
}

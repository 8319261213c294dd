use super::{open_trusted_workspace, print_json, resolve_identity, try_load_settings, Outcome};
use bp_core::app_error::AppResult;
use bp_core::config::{resolve_shared_root, save_settings, WorkspaceSettingsV1};
use bp_core::signed_store::SignedDocumentStore;
use bp_core::snapshot::build_snapshot;
use bp_core::sync::{sync_pull, sync_push, sync_status, validate_exchange, WorkspaceSyncResult};
use bp_core::workspace::WorkspacePaths;
use std::path::Path;
use tracing::info;

fn workspace_paths(local_root: &Path, settings: Option<&WorkspaceSettingsV1>, shared_root: Option<&str>) -> AppResult<WorkspacePaths> {
    let shared_root = resolve_shared_root(shared_root.map(Path::new), settings)?;
    Ok(WorkspacePaths::new(local_root, shared_root))
}

fn finish(result: &WorkspaceSyncResult) -> Outcome {
    print_json(result);
    if result.success {
        Outcome::Done
    } else {
        Outcome::Blocked
    }
}

pub fn run_status(local_root: &Path, shared_root: Option<&str>) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let paths = workspace_paths(local_root, settings.as_ref(), shared_root)?;
    let summary = sync_status(&paths)?;
    print_json(&summary);
    Ok(Outcome::Done)
}

pub fn run_push(identity_root: &Path, local_root: &Path, shared_root: Option<&str>, now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let paths = workspace_paths(local_root, settings.as_ref(), shared_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let store = SignedDocumentStore::default();
    let workspace = open_trusted_workspace(&store, local_root, &identity, now_ms)?;

    let result = sync_push(
        &store,
        &paths,
        &workspace.project.project_id,
        &identity.signing_key,
        &identity.public_key,
        now_ms,
    )?;
    Ok(finish(&result))
}

/// A first successful pull into an empty local root records the shared root and identity.
pub fn run_pull(identity_root: &Path, local_root: &Path, shared_root: Option<&str>, now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let paths = workspace_paths(local_root, settings.as_ref(), shared_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;

    let result = sync_pull(&SignedDocumentStore::default(), &paths, &identity.public_key, now_ms)?;
    if result.success && settings.is_none() && result.applied_document_count > 0 {
        save_settings(
            local_root,
            &WorkspaceSettingsV1::new(&paths.shared_root, Some(identity.profile.user_id.to_string())),
        )?;
        info!(local_root = %local_root.display(), "recorded workspace settings after first pull");
    }
    Ok(finish(&result))
}

pub fn run_verify(identity_root: &Path, root: &Path, document_paths: &[String], now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let document_paths = if document_paths.is_empty() {
        build_snapshot(root)?
            .into_iter()
            .map(|entry| entry.document_path)
            .collect::<Vec<_>>()
    } else {
        document_paths.to_vec()
    };

    let result = validate_exchange(&SignedDocumentStore::default(), root, &document_paths, &identity.public_key);
    print_json(&serde_json::json!({
        "root": root,
        "checked": document_paths.len(),
        "result": result,
    }));
    if result.is_valid {
        Ok(Outcome::Done)
    } else {
        Ok(Outcome::Blocked)
    }
}

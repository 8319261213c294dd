use super::{open_trusted_workspace, print_json, resolve_identity, try_load_settings, Outcome};
use bp_core::app_error::{AppError, AppResult};
use bp_core::config::{save_settings, WorkspaceSettingsV1};
use bp_core::documents::ReleaseStatus;
use bp_core::project::{new_project, save_item, save_version, ItemEditRequest, ProjectCreateRequest, VersionEditRequest};
use bp_core::signed_store::SignedDocumentStore;
use bp_core::types::VersionId;
use bp_core::workspace::{load_workspace, save_workspace, workspace_exists};
use std::path::Path;

pub struct InitArgs<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub shared_root: &'a Path,
    pub initial_version: Option<&'a str>,
    pub versioning_scheme: Option<&'a str>,
}

pub fn run_init(identity_root: &Path, local_root: &Path, args: &InitArgs<'_>, now_ms: i64) -> AppResult<Outcome> {
    if workspace_exists(local_root) {
        return Err(AppError::new(
            "BP_WORKSPACE_EXISTS",
            "workspace",
            "a project workspace already exists at this location",
            false,
            serde_json::json!({ "path": local_root }),
        ));
    }
    let identity = resolve_identity(identity_root, None, now_ms)?;
    let workspace = new_project(
        &ProjectCreateRequest {
            name: args.name.to_string(),
            project_code: args.code.to_string(),
            versioning_scheme: args.versioning_scheme.map(str::to_string),
            initial_version: args.initial_version.map(str::to_string),
        },
        &identity.profile,
        now_ms,
    )?;

    let store = SignedDocumentStore::default();
    save_workspace(&store, local_root, &workspace, &identity.signing_key)?;
    save_settings(
        local_root,
        &WorkspaceSettingsV1::new(args.shared_root, Some(identity.profile.user_id.to_string())),
    )?;

    print_json(&serde_json::json!({
        "status": "ok",
        "project_id": workspace.project.project_id,
        "project_code": workspace.project.project_code,
        "identity": identity.profile.user_id,
        "versions": workspace.versions.iter().map(|v| &v.version.version_id).collect::<Vec<_>>(),
    }));
    Ok(Outcome::Done)
}

pub fn run_show(identity_root: &Path, local_root: &Path, now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let loaded = load_workspace(&SignedDocumentStore::default(), local_root, &identity.public_key, now_ms);

    let versions = loaded
        .workspace
        .as_ref()
        .map(|workspace| {
            workspace
                .versions
                .iter()
                .map(|snapshot| {
                    serde_json::json!({
                        "version_id": snapshot.version.version_id,
                        "name": snapshot.version.name,
                        "status": snapshot.version.status,
                        "items": snapshot.items.iter().map(|item| serde_json::json!({
                            "item_id": item.item_id,
                            "item_key": item.item_key,
                            "title": item.title,
                            "is_done": item.is_done,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    print_json(&serde_json::json!({
        "trust": loaded.trust_report,
        "project": loaded.workspace.as_ref().map(|w| &w.project),
        "members": loaded.workspace.as_ref().map(|w| &w.members.members),
        "versions": versions,
    }));
    Ok(Outcome::Done)
}

pub fn run_add_version(
    identity_root: &Path,
    local_root: &Path,
    name: &str,
    status: ReleaseStatus,
    notes: Option<&str>,
    now_ms: i64,
) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let store = SignedDocumentStore::default();
    let mut workspace = open_trusted_workspace(&store, local_root, &identity, now_ms)?;

    let version_id = save_version(
        &mut workspace,
        &VersionEditRequest {
            version_id: None,
            name: name.to_string(),
            status,
            notes: notes.map(str::to_string),
        },
        now_ms,
    )?;
    save_workspace(&store, local_root, &workspace, &identity.signing_key)?;

    print_json(&serde_json::json!({ "status": "ok", "version_id": version_id }));
    Ok(Outcome::Done)
}

pub struct AddItemArgs<'a> {
    pub version_id: &'a str,
    pub title: &'a str,
    pub item_type: &'a str,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub done: bool,
}

pub fn run_add_item(identity_root: &Path, local_root: &Path, args: &AddItemArgs<'_>, now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let store = SignedDocumentStore::default();
    let mut workspace = open_trusted_workspace(&store, local_root, &identity, now_ms)?;

    let version_id = VersionId(args.version_id.to_string());
    let item_id = save_item(
        &mut workspace,
        &ItemEditRequest {
            version_id: version_id.clone(),
            item_id: None,
            item_type_id: args.item_type.to_string(),
            category_id: args.category.to_string(),
            title: args.title.to_string(),
            description: args.description.map(str::to_string),
            is_done: args.done,
        },
        &identity.profile,
        now_ms,
    )?;
    save_workspace(&store, local_root, &workspace, &identity.signing_key)?;

    let item_key = workspace
        .version(version_id.as_str())
        .and_then(|snapshot| snapshot.items.iter().find(|item| item.item_id == item_id))
        .map(|item| item.item_key.clone());
    print_json(&serde_json::json!({
        "status": "ok",
        "item_id": item_id,
        "item_key": item_key,
    }));
    Ok(Outcome::Done)
}

//! Pure edits of a [`ProjectWorkspaceSnapshot`]. Nothing here touches disk;
//! callers persist the result with `save_workspace`.

use crate::app_error::{AppError, AppResult};
use crate::documents::{
    CategoryDefinition, ChangelogRules, ItemDocument, ItemKeyRule, ItemKeyScope, ItemTypeDefinition,
    MemberDocument, MemberRole, ProjectConfigurationDocument, ProjectMember, ReleaseStatus,
    VersionDocument, DOCUMENT_SCHEMA_VERSION,
};
use crate::identity::IdentityProfile;
use crate::types::{ItemId, ProjectId, UserId, VersionId};
use crate::workspace::{ProjectWorkspaceSnapshot, VersionWorkspaceSnapshot};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ProjectCreateRequest {
    pub name: String,
    pub project_code: String,
    pub versioning_scheme: Option<String>,
    pub initial_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VersionEditRequest {
    /// `None` adds a new version.
    pub version_id: Option<VersionId>,
    pub name: String,
    pub status: ReleaseStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ItemEditRequest {
    pub version_id: VersionId,
    /// `None` adds a new item.
    pub item_id: Option<ItemId>,
    pub item_type_id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
}

#[derive(Debug, Clone)]
pub struct MemberInviteRequest {
    pub user_id: UserId,
    pub display_name: String,
    pub public_key: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone)]
pub struct MemberUpdateRequest {
    pub user_id: UserId,
    pub display_name: String,
    pub role: MemberRole,
    pub is_active: bool,
}

fn project_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "project", message, false, details)
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(project_error(
            "BP_PROJECT_FIELD_REQUIRED",
            "required field is empty",
            serde_json::json!({ "field": field }),
        ));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn definition(id: &str, display_name: &str) -> (String, ItemTypeDefinition) {
    (
        id.to_string(),
        ItemTypeDefinition {
            id: id.to_string(),
            display_name: display_name.to_string(),
        },
    )
}

fn key_rule(id: &str, prefix: &str, scope: ItemKeyScope) -> (String, ItemKeyRule) {
    (
        id.to_string(),
        ItemKeyRule {
            prefix: prefix.to_string(),
            scope,
        },
    )
}

pub fn new_project(
    request: &ProjectCreateRequest,
    creator: &IdentityProfile,
    now_ms: i64,
) -> AppResult<ProjectWorkspaceSnapshot> {
    let name = required(&request.name, "name")?;
    let project_code = required(&request.project_code, "project_code")?.to_uppercase();
    let project_id = ProjectId::generate();

    let default_categories = [
        ("added", "Added"),
        ("changed", "Changed"),
        ("fixed", "Fixed"),
        ("removed", "Removed"),
        ("security", "Security"),
    ]
    .into_iter()
    .map(|(id, display_name)| CategoryDefinition {
        id: id.to_string(),
        display_name: display_name.to_string(),
    })
    .collect();

    let project = ProjectConfigurationDocument {
        schema_version: DOCUMENT_SCHEMA_VERSION,
        project_id: project_id.clone(),
        name,
        versioning_scheme: optional_text(request.versioning_scheme.as_deref())
            .unwrap_or_else(|| "SemVer".to_string()),
        created_at_ms: now_ms,
        default_categories,
        item_types: BTreeMap::from([
            definition("feature", "Feature"),
            definition("bug", "Bug"),
            definition("issue", "Issue"),
            definition("security", "Security"),
        ]),
        item_key_rules: BTreeMap::from([
            key_rule("feature", &project_code, ItemKeyScope::Version),
            key_rule("bug", "BUG", ItemKeyScope::Project),
            key_rule("issue", "ISS", ItemKeyScope::Project),
            key_rule("security", "SEC", ItemKeyScope::Project),
        ]),
        changelog_rules: ChangelogRules {
            include_incomplete_by_default: false,
            include_item_keys_by_default: true,
            include_descriptions_by_default: false,
            compact_mode_by_default: false,
        },
        project_code,
    };

    let members = MemberDocument {
        schema_version: DOCUMENT_SCHEMA_VERSION,
        project_id,
        membership_revision: 1,
        members: vec![ProjectMember {
            user_id: creator.user_id.clone(),
            display_name: creator.display_name.clone(),
            public_key: creator.public_key_base64.clone(),
            role: MemberRole::Admin,
            joined_at_ms: now_ms,
            is_active: true,
        }],
    };

    let mut workspace = ProjectWorkspaceSnapshot {
        project,
        members,
        versions: Vec::new(),
    };
    if let Some(version_name) = optional_text(request.initial_version.as_deref()) {
        save_version(
            &mut workspace,
            &VersionEditRequest {
                version_id: None,
                name: version_name,
                status: ReleaseStatus::Planned,
                notes: None,
            },
            now_ms,
        )?;
    }
    Ok(workspace)
}

/// Adds or updates a version and returns its id. Versions stay ordered newest first.
pub fn save_version(
    workspace: &mut ProjectWorkspaceSnapshot,
    request: &VersionEditRequest,
    now_ms: i64,
) -> AppResult<VersionId> {
    let name = required(&request.name, "name")?;
    let notes = optional_text(request.notes.as_deref());

    let version_id = match &request.version_id {
        Some(version_id) => {
            let snapshot = find_version_mut(workspace, version_id)?;
            let version = &mut snapshot.version;
            version.name = name;
            if request.status == ReleaseStatus::Released && version.released_at_ms.is_none() {
                version.released_at_ms = Some(now_ms);
            }
            version.status = request.status;
            version.notes = notes;
            version_id.clone()
        }
        None => {
            let version_id = VersionId::generate();
            workspace.versions.push(VersionWorkspaceSnapshot {
                version: VersionDocument {
                    schema_version: DOCUMENT_SCHEMA_VERSION,
                    project_id: workspace.project.project_id.clone(),
                    version_id: version_id.clone(),
                    name,
                    status: request.status,
                    created_at_ms: now_ms,
                    released_at_ms: (request.status == ReleaseStatus::Released).then_some(now_ms),
                    notes,
                    manual_order: Vec::new(),
                },
                items: Vec::new(),
            });
            version_id
        }
    };

    workspace
        .versions
        .sort_by(|a, b| b.version.created_at_ms.cmp(&a.version.created_at_ms));
    Ok(version_id)
}

fn find_version_mut<'a>(
    workspace: &'a mut ProjectWorkspaceSnapshot,
    version_id: &VersionId,
) -> AppResult<&'a mut VersionWorkspaceSnapshot> {
    workspace
        .versions
        .iter_mut()
        .find(|v| &v.version.version_id == version_id)
        .ok_or_else(|| {
            project_error(
                "BP_PROJECT_VERSION_NOT_FOUND",
                "version was not found in the workspace",
                serde_json::json!({ "version_id": version_id }),
            )
        })
}

/// Leading `major.minor` of a version name; unparseable parts count as 0.
pub fn parse_major_minor(version_name: &str) -> (u32, u32) {
    let mut parts = version_name
        .split('.')
        .map(str::trim)
        .filter(|p| !p.is_empty());
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}

pub fn format_project_scoped_key(prefix: &str, sequence: usize) -> String {
    format!("{prefix}-{sequence}")
}

pub fn format_version_scoped_key(project_code: &str, major: u32, minor: u32, sequence: usize) -> String {
    format!("{project_code}-{major}{minor}{sequence}")
}

fn generate_item_key(workspace: &ProjectWorkspaceSnapshot, version: &VersionWorkspaceSnapshot, item_type_id: &str) -> String {
    let Some(rule) = workspace.project.item_key_rules.get(item_type_id) else {
        return ItemId::generate().0;
    };
    match rule.scope {
        ItemKeyScope::Project => {
            let sequence = workspace
                .versions
                .iter()
                .flat_map(|v| v.items.iter())
                .filter(|item| item.item_type_id == item_type_id)
                .count()
                + 1;
            format_project_scoped_key(&rule.prefix, sequence)
        }
        ItemKeyScope::Version => {
            let (major, minor) = parse_major_minor(&version.version.name);
            let sequence = version
                .items
                .iter()
                .filter(|item| item.item_type_id == item_type_id)
                .count()
                + 1;
            format_version_scoped_key(&rule.prefix, major, minor, sequence)
        }
    }
}

/// Adds or updates an item and returns its id. The item key is assigned once, on creation.
pub fn save_item(
    workspace: &mut ProjectWorkspaceSnapshot,
    request: &ItemEditRequest,
    editor: &IdentityProfile,
    now_ms: i64,
) -> AppResult<ItemId> {
    let title = required(&request.title, "title")?;
    let description = optional_text(request.description.as_deref());
    let item_type_id = required(&request.item_type_id, "item_type_id")?;
    let category_id = required(&request.category_id, "category_id")?;

    let version_index = workspace
        .versions
        .iter()
        .position(|v| v.version.version_id == request.version_id)
        .ok_or_else(|| {
            project_error(
                "BP_PROJECT_VERSION_NOT_FOUND",
                "version was not found in the workspace",
                serde_json::json!({ "version_id": request.version_id }),
            )
        })?;

    let item_id = match &request.item_id {
        Some(item_id) => {
            let item = workspace.versions[version_index]
                .items
                .iter_mut()
                .find(|item| &item.item_id == item_id)
                .ok_or_else(|| {
                    project_error(
                        "BP_PROJECT_ITEM_NOT_FOUND",
                        "item was not found in the version",
                        serde_json::json!({ "item_id": item_id }),
                    )
                })?;
            item.item_type_id = item_type_id;
            item.category_id = category_id;
            item.title = title;
            item.description = description;
            item.is_done = request.is_done;
            item.updated_at_ms = now_ms;
            item.last_modified_by_user_id = editor.user_id.clone();
            item.last_modified_by_name = editor.display_name.clone();
            item_id.clone()
        }
        None => {
            let item_key = generate_item_key(workspace, &workspace.versions[version_index], &item_type_id);
            let item_id = ItemId::generate();
            let project_id = workspace.project.project_id.clone();
            workspace.versions[version_index].items.push(ItemDocument {
                schema_version: DOCUMENT_SCHEMA_VERSION,
                project_id,
                version_id: request.version_id.clone(),
                item_id: item_id.clone(),
                item_key,
                item_type_id,
                category_id,
                title,
                description,
                is_done: request.is_done,
                tags: Vec::new(),
                created_at_ms: now_ms,
                updated_at_ms: now_ms,
                last_modified_by_user_id: editor.user_id.clone(),
                last_modified_by_name: editor.display_name.clone(),
            });
            item_id
        }
    };

    let version = &mut workspace.versions[version_index];
    version.items.sort_by_key(|item| item.created_at_ms);
    version.version.manual_order = version.items.iter().map(|item| item.item_id.clone()).collect();
    Ok(item_id)
}

pub fn invite_member(
    workspace: &mut ProjectWorkspaceSnapshot,
    request: &MemberInviteRequest,
    now_ms: i64,
) -> AppResult<()> {
    let display_name = required(&request.display_name, "display_name")?;
    let public_key = required(&request.public_key, "public_key")?;
    let members = &mut workspace.members;
    if members.members.iter().any(|m| m.user_id == request.user_id) {
        return Err(project_error(
            "BP_PROJECT_MEMBER_EXISTS",
            "user is already a member of the project",
            serde_json::json!({ "user_id": request.user_id }),
        ));
    }
    members.members.push(ProjectMember {
        user_id: request.user_id.clone(),
        display_name,
        public_key,
        role: request.role,
        joined_at_ms: now_ms,
        is_active: true,
    });
    members.membership_revision += 1;
    Ok(())
}

pub fn update_member(workspace: &mut ProjectWorkspaceSnapshot, request: &MemberUpdateRequest) -> AppResult<()> {
    let display_name = required(&request.display_name, "display_name")?;
    let members = &mut workspace.members;
    let index = members
        .members
        .iter()
        .position(|m| m.user_id == request.user_id)
        .ok_or_else(|| {
            project_error(
                "BP_PROJECT_MEMBER_NOT_FOUND",
                "member was not found in the project",
                serde_json::json!({ "user_id": request.user_id }),
            )
        })?;

    let remaining_admins = members
        .members
        .iter()
        .enumerate()
        .filter(|(i, m)| *i != index && m.is_active && m.role == MemberRole::Admin)
        .count();
    let stays_admin = request.is_active && request.role == MemberRole::Admin;
    if remaining_admins == 0 && !stays_admin {
        return Err(project_error(
            "BP_PROJECT_LAST_ADMIN",
            "project must keep at least one active admin",
            serde_json::json!({ "user_id": request.user_id }),
        ));
    }

    let member = &mut members.members[index];
    member.display_name = display_name;
    member.role = request.role;
    member.is_active = request.is_active;
    members.membership_revision += 1;
    Ok(())
}

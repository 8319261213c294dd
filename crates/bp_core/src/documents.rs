//! Signed document shapes of a project workspace.
//!
//! Every document carries `schema_version` and the owning `project_id`.
//! Documents are never patched in place: a save rewrites the whole document
//! and its detached signature.

use crate::types::{ItemId, ProjectId, UserId, VersionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DOCUMENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Planned,
    InProgress,
    Frozen,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Editor,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKeyScope {
    Project,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTypeDefinition {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKeyRule {
    pub prefix: String,
    pub scope: ItemKeyScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogRules {
    pub include_incomplete_by_default: bool,
    pub include_item_keys_by_default: bool,
    pub include_descriptions_by_default: bool,
    pub compact_mode_by_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfigurationDocument {
    pub schema_version: u32,
    pub project_id: ProjectId,
    pub name: String,
    pub project_code: String,
    pub versioning_scheme: String,
    pub created_at_ms: i64,
    pub default_categories: Vec<CategoryDefinition>,
    pub item_types: BTreeMap<String, ItemTypeDefinition>,
    pub item_key_rules: BTreeMap<String, ItemKeyRule>,
    pub changelog_rules: ChangelogRules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub user_id: UserId,
    pub display_name: String,
    pub public_key: String,
    pub role: MemberRole,
    pub joined_at_ms: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDocument {
    pub schema_version: u32,
    pub project_id: ProjectId,
    pub membership_revision: u64,
    pub members: Vec<ProjectMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDocument {
    pub schema_version: u32,
    pub project_id: ProjectId,
    pub version_id: VersionId,
    pub name: String,
    pub status: ReleaseStatus,
    pub created_at_ms: i64,
    pub released_at_ms: Option<i64>,
    pub notes: Option<String>,
    pub manual_order: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub schema_version: u32,
    pub project_id: ProjectId,
    pub version_id: VersionId,
    pub item_id: ItemId,
    pub item_key: String,
    pub item_type_id: String,
    pub category_id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub tags: Vec<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub last_modified_by_user_id: UserId,
    pub last_modified_by_name: String,
}

#![allow(dead_code)]

use bp_core::documents::ReleaseStatus;
use bp_core::identity::{create_identity, PlainFileKeyProtector, StoredIdentity};
use bp_core::project::{new_project, save_item, ItemEditRequest, ProjectCreateRequest};
use bp_core::signed_store::SignedDocumentStore;
use bp_core::workspace::{save_workspace, ProjectWorkspaceSnapshot};
use std::path::Path;

pub const NOW_MS: i64 = 1_700_000_000_000;

pub fn identity(root: &Path) -> StoredIdentity {
    create_identity(&root.join("identities"), "Tester", &PlainFileKeyProtector, NOW_MS)
        .expect("create identity")
}

/// Project `VS` with version `1.0.0` holding one feature item.
pub fn vs_workspace(identity: &StoredIdentity) -> ProjectWorkspaceSnapshot {
    let mut workspace = new_project(
        &ProjectCreateRequest {
            name: "Visual Studio Extension".to_string(),
            project_code: "vs".to_string(),
            versioning_scheme: None,
            initial_version: Some("1.0.0".to_string()),
        },
        &identity.profile,
        NOW_MS,
    )
    .expect("new project");
    let version_id = workspace.versions[0].version.version_id.clone();
    assert_eq!(workspace.versions[0].version.status, ReleaseStatus::Planned);
    save_item(
        &mut workspace,
        &ItemEditRequest {
            version_id,
            item_id: None,
            item_type_id: "feature".to_string(),
            category_id: "added".to_string(),
            title: "Offline sync".to_string(),
            description: Some("Shared folder exchange".to_string()),
            is_done: false,
        },
        &identity.profile,
        NOW_MS + 1,
    )
    .expect("save item");
    workspace
}

pub fn seed_local(root: &Path, identity: &StoredIdentity) -> ProjectWorkspaceSnapshot {
    let workspace = vs_workspace(identity);
    save_workspace(&SignedDocumentStore::default(), root, &workspace, &identity.signing_key)
        .expect("save workspace");
    workspace
}

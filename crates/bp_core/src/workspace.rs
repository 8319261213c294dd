use crate::app_error::{AppError, AppResult};
use crate::documents::{ItemDocument, MemberDocument, ProjectConfigurationDocument, VersionDocument};
use crate::signature::{PublicKeyMaterial, SigningKeyMaterial};
use crate::signed_store::SignedDocumentStore;
use crate::trust::{TrustAccumulator, TrustReport};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The private local copy and the shared rendezvous copy of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspacePaths {
    pub local_root: PathBuf,
    pub shared_root: PathBuf,
}

impl WorkspacePaths {
    pub fn new(local_root: impl Into<PathBuf>, shared_root: impl Into<PathBuf>) -> Self {
        Self {
            local_root: local_root.into(),
            shared_root: shared_root.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    pub root: PathBuf,
    pub project_dir: PathBuf,
    pub project_document: PathBuf,
    pub members_document: PathBuf,
    pub versions_dir: PathBuf,
}

pub fn workspace_layout(root: &Path) -> WorkspaceLayout {
    WorkspaceLayout {
        root: root.to_path_buf(),
        project_dir: root.join("project"),
        project_document: root.join("project/project.json"),
        members_document: root.join("project/members.json"),
        versions_dir: root.join("versions"),
    }
}

impl WorkspaceLayout {
    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir.join(version_id)
    }

    pub fn version_document(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join("version.json")
    }

    pub fn item_document(&self, version_id: &str, item_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join("items")
            .join(format!("{item_id}.json"))
    }
}

pub fn workspace_exists(root: &Path) -> bool {
    workspace_layout(root).project_document.exists()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionWorkspaceSnapshot {
    pub version: VersionDocument,
    pub items: Vec<ItemDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWorkspaceSnapshot {
    pub project: ProjectConfigurationDocument,
    pub members: MemberDocument,
    pub versions: Vec<VersionWorkspaceSnapshot>,
}

impl ProjectWorkspaceSnapshot {
    pub fn version(&self, version_id: &str) -> Option<&VersionWorkspaceSnapshot> {
        self.versions
            .iter()
            .find(|v| v.version.version_id.as_str() == version_id)
    }

    pub fn item_count(&self) -> usize {
        self.versions.iter().map(|v| v.items.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct ProjectWorkspaceLoadResult {
    /// `None` only when the trust report is `Corrupt`.
    pub workspace: Option<ProjectWorkspaceSnapshot>,
    pub trust_report: TrustReport,
}

fn workspace_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "workspace", message, false, details)
}

/// Identifiers become directory and file names, so they must be a single plain segment.
pub fn validate_path_segment(id: &str) -> AppResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(workspace_error(
            "BP_WORKSPACE_ID_INVALID",
            "identifier is not usable as a workspace path segment",
            serde_json::json!({ "id": id }),
        ))
    }
}

pub fn save_workspace(
    store: &SignedDocumentStore,
    root: &Path,
    workspace: &ProjectWorkspaceSnapshot,
    signing_key: &SigningKeyMaterial,
) -> AppResult<()> {
    let layout = workspace_layout(root);
    fs::create_dir_all(&layout.project_dir)
        .map_err(|e| AppError::io("workspace", "failed creating project directory", &layout.project_dir, &e))?;
    fs::create_dir_all(&layout.versions_dir)
        .map_err(|e| AppError::io("workspace", "failed creating versions directory", &layout.versions_dir, &e))?;

    store.write(&layout.project_document, &workspace.project, signing_key)?;
    store.write(&layout.members_document, &workspace.members, signing_key)?;

    let mut written = 2usize;
    for snapshot in &workspace.versions {
        let version_id = snapshot.version.version_id.as_str();
        validate_path_segment(version_id)?;
        let items_dir = layout.version_dir(version_id).join("items");
        fs::create_dir_all(&items_dir)
            .map_err(|e| AppError::io("workspace", "failed creating items directory", &items_dir, &e))?;

        store.write(&layout.version_document(version_id), &snapshot.version, signing_key)?;
        written += 1;
        for item in &snapshot.items {
            validate_path_segment(item.item_id.as_str())?;
            store.write(
                &layout.item_document(version_id, item.item_id.as_str()),
                item,
                signing_key,
            )?;
            written += 1;
        }
    }

    info!(
        root = %root.display(),
        project_code = %workspace.project.project_code,
        documents = written,
        "saved signed workspace"
    );
    Ok(())
}

/// Loads and verifies the whole workspace. Never fails: anything that keeps
/// the workspace from being assembled becomes a `Corrupt` trust report.
pub fn load_workspace(
    store: &SignedDocumentStore,
    root: &Path,
    public_key: &PublicKeyMaterial,
    now_ms: i64,
) -> ProjectWorkspaceLoadResult {
    let mut trust = TrustAccumulator::new();
    match assemble_workspace(store, root, public_key, &mut trust) {
        Ok(workspace) => {
            let trust_report = trust.finish(now_ms);
            if !trust.invalid_documents().is_empty() {
                warn!(
                    root = %root.display(),
                    invalid = trust.invalid_documents().len(),
                    "workspace loaded with invalid signatures"
                );
            }
            ProjectWorkspaceLoadResult {
                workspace: Some(workspace),
                trust_report,
            }
        }
        Err(err) => {
            warn!(root = %root.display(), code = %err.code, "workspace could not be assembled");
            ProjectWorkspaceLoadResult {
                workspace: None,
                trust_report: TrustReport::corrupt(&err.to_string(), now_ms),
            }
        }
    }
}

fn sorted_entries(dir: &Path, want_dirs: bool) -> AppResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries =
        fs::read_dir(dir).map_err(|e| AppError::io("workspace", "failed listing directory", dir, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| AppError::io("workspace", "failed reading directory entry", dir, &e))?;
        let path = entry.path();
        if want_dirs && path.is_dir() {
            out.push(path);
        } else if !want_dirs
            && path.is_file()
            && path.extension().and_then(|x| x.to_str()) == Some("json")
        {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn assemble_workspace(
    store: &SignedDocumentStore,
    root: &Path,
    public_key: &PublicKeyMaterial,
    trust: &mut TrustAccumulator,
) -> AppResult<ProjectWorkspaceSnapshot> {
    let layout = workspace_layout(root);
    if !layout.project_dir.is_dir() {
        return Err(workspace_error(
            "BP_WORKSPACE_MISSING",
            "workspace project directory is missing",
            serde_json::json!({ "path": layout.project_dir }),
        ));
    }

    let project = store.read::<ProjectConfigurationDocument>(&layout.project_document, public_key)?;
    trust.record(&layout.project_document, project.is_signature_valid);
    let members = store.read::<MemberDocument>(&layout.members_document, public_key)?;
    trust.record(&layout.members_document, members.is_signature_valid);

    let mut versions = Vec::new();
    if layout.versions_dir.is_dir() {
        for version_dir in sorted_entries(&layout.versions_dir, true)? {
            let version_path = version_dir.join("version.json");
            let version = store.read::<VersionDocument>(&version_path, public_key)?;
            trust.record(&version_path, version.is_signature_valid);

            let mut items = Vec::new();
            let items_dir = version_dir.join("items");
            if items_dir.is_dir() {
                for item_path in sorted_entries(&items_dir, false)? {
                    let item = store.read::<ItemDocument>(&item_path, public_key)?;
                    trust.record(&item_path, item.is_signature_valid);
                    items.push(item.document);
                }
            }
            debug!(version = %version.document.name, items = items.len(), "loaded version");
            versions.push(VersionWorkspaceSnapshot {
                version: version.document,
                items,
            });
        }
    }

    Ok(ProjectWorkspaceSnapshot {
        project: project.document,
        members: members.document,
        versions,
    })
}

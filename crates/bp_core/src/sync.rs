use crate::app_error::{AppError, AppResult};
use crate::signature::{PublicKeyMaterial, SigningKeyMaterial};
use crate::signed_store::{signature_relpath_for, SignedDocumentStore};
use crate::snapshot::{build_snapshot, ManifestEntry};
use crate::sync_analysis::{analyze_roots, tracked_entries, SyncTrackedEntry};
use crate::sync_manifest::{
    current_manifest_version, read_manifest, write_manifest, SyncManifestDocument,
    SYNC_MANIFEST_SCHEMA_VERSION,
};
use crate::sync_state::{load_sync_state, save_sync_state};
use crate::types::ProjectId;
use crate::workspace::{validate_path_segment, WorkspacePaths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Push,
    Pull,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSyncResult {
    pub success: bool,
    pub operation: SyncOperation,
    pub applied_document_count: usize,
    pub manifest_version: u64,
    pub batch_id: Option<String>,
    pub conflicts: Vec<String>,
    pub summary: String,
}

impl WorkspaceSyncResult {
    fn noop(operation: SyncOperation, manifest_version: u64, summary: &str) -> Self {
        Self {
            success: true,
            operation,
            applied_document_count: 0,
            manifest_version,
            batch_id: None,
            conflicts: Vec::new(),
            summary: summary.to_string(),
        }
    }

    fn blocked(operation: SyncOperation, manifest_version: u64, conflicts: Vec<String>, summary: String) -> Self {
        Self {
            success: false,
            operation,
            applied_document_count: 0,
            manifest_version,
            batch_id: None,
            conflicts,
            summary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncHealth {
    Idle,
    Ready,
    NeedsAttention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub health: SyncHealth,
    pub pending_outgoing: usize,
    pub pending_incoming: usize,
    pub conflicts: Vec<String>,
    pub last_pulled_manifest_version: u64,
    pub last_pushed_manifest_version: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeValidationResult {
    pub is_valid: bool,
    pub invalid_document_paths: Vec<String>,
}

fn sync_error(code: &str, message: &str, details: serde_json::Value) -> AppError {
    AppError::new(code, "sync", message, false, details)
}

/// Batch ids sort by publish time; the uuid suffix keeps concurrent publishers apart.
pub fn new_batch_id(now_ms: i64) -> String {
    format!("{:013}_{}", now_ms, uuid::Uuid::new_v4().simple())
}

fn resolve_relpath(root: &Path, relpath: &str) -> PathBuf {
    relpath
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

fn copy_atomic(source: &Path, dest: &Path) -> AppResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("sync", "failed creating destination directory", parent, &e))?;
    }
    let mut tmp_name = dest.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::copy(source, &tmp).map_err(|e| {
        sync_error(
            "BP_SYNC_COPY_FAILED",
            "failed copying synchronized file",
            serde_json::json!({ "error": e.to_string(), "from": source, "to": tmp }),
        )
    })?;
    fs::rename(&tmp, dest).map_err(|e| AppError::io("sync", "failed renaming synchronized file", dest, &e))
}

fn remove_if_present(path: &Path) -> AppResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::io("sync", "failed removing deleted document", path, &e)),
    }
}

/// Applies one document and its signature to `target`. Archive roots
/// (staging, inbox, packs) only receive copies; a document deleted at the
/// source is removed from `target` and leaves no archive trace.
fn transfer_pair(source_root: &Path, document_relpath: &str, target: &Path, archives: &[&Path]) -> AppResult<()> {
    let relpaths = [document_relpath.to_string(), signature_relpath_for(document_relpath)];
    let source_document = resolve_relpath(source_root, document_relpath);

    if !source_document.is_file() {
        for relpath in &relpaths {
            remove_if_present(&resolve_relpath(target, relpath))?;
        }
        debug!(path = document_relpath, "propagated document deletion");
        return Ok(());
    }

    for relpath in &relpaths {
        let source = resolve_relpath(source_root, relpath);
        for dest_root in archives.iter().copied().chain(std::iter::once(target)) {
            copy_atomic(&source, &resolve_relpath(dest_root, relpath))?;
        }
    }
    debug!(path = document_relpath, "transferred document pair");
    Ok(())
}

/// Baseline recorded after a push. Documents still pending a pull keep their
/// previous baseline entry, or stay untracked, so the next analysis keeps
/// them incoming instead of reading the local absence as a deletion.
fn baseline_after_push(
    previous: &[SyncTrackedEntry],
    shared_entries: &[ManifestEntry],
    pending_incoming: &[String],
) -> Vec<SyncTrackedEntry> {
    let pending: BTreeSet<&str> = pending_incoming.iter().map(String::as_str).collect();
    let mut baseline: Vec<SyncTrackedEntry> = shared_entries
        .iter()
        .filter(|entry| !pending.contains(entry.document_path.as_str()))
        .map(SyncTrackedEntry::from)
        .collect();
    baseline.extend(
        previous
            .iter()
            .filter(|entry| pending.contains(entry.path.as_str()))
            .cloned(),
    );
    baseline.sort_by(|a, b| a.path.cmp(&b.path));
    baseline
}

pub fn sync_push(
    store: &SignedDocumentStore,
    paths: &WorkspacePaths,
    project_id: &ProjectId,
    signing_key: &SigningKeyMaterial,
    public_key: &PublicKeyMaterial,
    now_ms: i64,
) -> AppResult<WorkspaceSyncResult> {
    fs::create_dir_all(&paths.shared_root)
        .map_err(|e| AppError::io("sync", "failed creating shared root", &paths.shared_root, &e))?;
    let mut state = load_sync_state(&paths.local_root)?;
    let analysis = analyze_roots(paths, &state.tracked_entries)?;

    if analysis.has_conflicts() {
        warn!(conflicts = analysis.conflicts.len(), "push blocked by conflicts");
        let summary = format!("Push blocked by {} conflicting documents.", analysis.conflicts.len());
        return Ok(WorkspaceSyncResult::blocked(
            SyncOperation::Push,
            state.last_pushed_manifest_version,
            analysis.conflicts,
            summary,
        ));
    }
    if !analysis.has_outgoing_changes() {
        return Ok(WorkspaceSyncResult::noop(
            SyncOperation::Push,
            state.last_pushed_manifest_version,
            "No local changes to push.",
        ));
    }

    let batch_id = new_batch_id(now_ms);
    let staging = paths.local_root.join("sync").join("staging").join(&batch_id);
    let pack = paths.shared_root.join("packs").join(&batch_id);
    for document_path in &analysis.outgoing {
        transfer_pair(&paths.local_root, document_path, &paths.shared_root, &[&staging, &pack])?;
    }

    let previous_version = current_manifest_version(store, &paths.shared_root, public_key)?;
    let manifest_version = previous_version + 1;
    let shared_entries = build_snapshot(&paths.shared_root)?;
    let manifest = SyncManifestDocument {
        schema_version: SYNC_MANIFEST_SCHEMA_VERSION,
        project_id: project_id.clone(),
        manifest_version,
        batch_id: batch_id.clone(),
        created_at_ms: now_ms,
        entries: shared_entries.clone(),
    };
    write_manifest(store, &paths.shared_root, &manifest, signing_key)?;

    state.last_pushed_manifest_version = manifest_version;
    state.last_pulled_manifest_version = state.last_pulled_manifest_version.max(previous_version);
    state.last_trust_validated_at_ms = Some(now_ms);
    state.remember_batch(&batch_id);
    state.unresolved_conflicts.clear();
    state.tracked_entries = baseline_after_push(&state.tracked_entries, &shared_entries, &analysis.incoming);
    save_sync_state(&paths.local_root, &state)?;

    let applied = analysis.outgoing.len();
    info!(batch_id = %batch_id, manifest_version, documents = applied, "pushed workspace changes");
    Ok(WorkspaceSyncResult {
        success: true,
        operation: SyncOperation::Push,
        applied_document_count: applied,
        manifest_version,
        batch_id: Some(batch_id),
        conflicts: Vec::new(),
        summary: format!("Pushed {applied} documents as manifest version {manifest_version}."),
    })
}

pub fn sync_pull(
    store: &SignedDocumentStore,
    paths: &WorkspacePaths,
    public_key: &PublicKeyMaterial,
    now_ms: i64,
) -> AppResult<WorkspaceSyncResult> {
    let mut state = load_sync_state(&paths.local_root)?;

    let manifest = match read_manifest(store, &paths.shared_root, public_key) {
        Ok(read) => read,
        Err(err) if err.is_not_found() => {
            return Ok(WorkspaceSyncResult::noop(
                SyncOperation::Pull,
                state.last_pulled_manifest_version,
                "No shared manifest has been published yet.",
            ));
        }
        Err(err) => return Err(err),
    };
    if !manifest.is_signature_valid {
        warn!(shared_root = %paths.shared_root.display(), "shared manifest failed signature verification");
        return Ok(WorkspaceSyncResult::blocked(
            SyncOperation::Pull,
            state.last_pulled_manifest_version,
            Vec::new(),
            "Shared manifest signature is invalid; nothing was pulled.".to_string(),
        ));
    }
    let manifest = manifest.document;
    validate_path_segment(&manifest.batch_id).map_err(|_| {
        sync_error(
            "BP_SYNC_MANIFEST_INVALID",
            "shared manifest batch id is not a usable directory name",
            serde_json::json!({ "batch_id": manifest.batch_id }),
        )
    })?;

    let analysis = analyze_roots(paths, &state.tracked_entries)?;
    if analysis.has_conflicts() {
        warn!(conflicts = analysis.conflicts.len(), "pull blocked by conflicts");
        state.unresolved_conflicts = analysis.conflicts.clone();
        save_sync_state(&paths.local_root, &state)?;
        let summary = format!("Pull blocked by {} conflicting documents.", analysis.conflicts.len());
        return Ok(WorkspaceSyncResult::blocked(
            SyncOperation::Pull,
            state.last_pulled_manifest_version,
            analysis.conflicts,
            summary,
        ));
    }
    if !analysis.has_incoming_changes() && manifest.manifest_version <= state.last_pulled_manifest_version {
        return Ok(WorkspaceSyncResult::noop(
            SyncOperation::Pull,
            manifest.manifest_version,
            "Workspace is already up to date.",
        ));
    }

    let inbox = paths.local_root.join("sync").join("inbox").join(&manifest.batch_id);
    for document_path in &analysis.incoming {
        transfer_pair(&paths.shared_root, document_path, &paths.local_root, &[&inbox])?;
    }

    state.last_pulled_manifest_version = manifest.manifest_version;
    state.last_trust_validated_at_ms = Some(now_ms);
    state.remember_batch(&manifest.batch_id);
    state.unresolved_conflicts.clear();
    state.tracked_entries = tracked_entries(&manifest.entries);
    save_sync_state(&paths.local_root, &state)?;

    let applied = analysis.incoming.len();
    info!(
        batch_id = %manifest.batch_id,
        manifest_version = manifest.manifest_version,
        documents = applied,
        "pulled shared changes"
    );
    Ok(WorkspaceSyncResult {
        success: true,
        operation: SyncOperation::Pull,
        applied_document_count: applied,
        manifest_version: manifest.manifest_version,
        batch_id: Some(manifest.batch_id),
        conflicts: Vec::new(),
        summary: format!(
            "Pulled {applied} documents from manifest version {}.",
            manifest.manifest_version
        ),
    })
}

pub fn sync_status(paths: &WorkspacePaths) -> AppResult<SyncSummary> {
    let state = load_sync_state(&paths.local_root)?;
    let analysis = analyze_roots(paths, &state.tracked_entries)?;
    let health = if analysis.has_conflicts() {
        SyncHealth::NeedsAttention
    } else if analysis.has_outgoing_changes() || analysis.has_incoming_changes() {
        SyncHealth::Ready
    } else {
        SyncHealth::Idle
    };
    Ok(SyncSummary {
        health,
        pending_outgoing: analysis.outgoing.len(),
        pending_incoming: analysis.incoming.len(),
        conflicts: analysis.conflicts,
        last_pulled_manifest_version: state.last_pulled_manifest_version,
        last_pushed_manifest_version: state.last_pushed_manifest_version,
    })
}

/// Checks detached signatures of `document_paths` under `root`. Missing or
/// unreadable pairs are reported as invalid rather than failing the check.
pub fn validate_exchange(
    store: &SignedDocumentStore,
    root: &Path,
    document_paths: &[String],
    public_key: &PublicKeyMaterial,
) -> ExchangeValidationResult {
    let mut invalid = Vec::new();
    let mut seen = BTreeSet::new();
    for document_path in document_paths {
        if !seen.insert(document_path.as_str()) {
            continue;
        }
        let valid = store
            .verify_file(&resolve_relpath(root, document_path), public_key)
            .unwrap_or(false);
        if !valid {
            invalid.push(document_path.clone());
        }
    }
    ExchangeValidationResult {
        is_valid: invalid.is_empty(),
        invalid_document_paths: invalid,
    }
}

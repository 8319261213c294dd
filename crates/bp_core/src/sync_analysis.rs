//! Three-way reconciliation of a local snapshot, a shared snapshot and the
//! baseline remembered after the last successful push or pull.

use crate::app_error::AppResult;
use crate::snapshot::{build_snapshot, ManifestEntry};
use crate::workspace::WorkspacePaths;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTrackedEntry {
    pub path: String,
    pub document_hash: String,
    pub signature_hash: String,
}

impl From<&ManifestEntry> for SyncTrackedEntry {
    fn from(entry: &ManifestEntry) -> Self {
        Self {
            path: entry.document_path.clone(),
            document_hash: entry.document_hash.clone(),
            signature_hash: entry.signature_hash.clone(),
        }
    }
}

pub fn tracked_entries(entries: &[ManifestEntry]) -> Vec<SyncTrackedEntry> {
    entries.iter().map(SyncTrackedEntry::from).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSyncAnalysis {
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
    pub conflicts: Vec<String>,
}

impl WorkspaceSyncAnalysis {
    pub fn has_outgoing_changes(&self) -> bool {
        !self.outgoing.is_empty()
    }

    pub fn has_incoming_changes(&self) -> bool {
        !self.incoming.is_empty()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Content fingerprint of one side for one path. `None` means absent.
type Fingerprint<'a> = Option<(&'a str, &'a str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathDecision<'a> {
    /// Never synchronized: compare local against shared only.
    NoBaseline,
    /// Compare each side against the last agreed fingerprint.
    HasBaseline(&'a str, &'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathAction {
    None,
    Outgoing,
    Incoming,
    Conflict,
}

fn decide_without_baseline(local: Fingerprint<'_>, shared: Fingerprint<'_>) -> PathAction {
    match (local, shared) {
        (Some(_), None) => PathAction::Outgoing,
        (None, Some(_)) => PathAction::Incoming,
        (Some(l), Some(s)) if l != s => PathAction::Conflict,
        _ => PathAction::None,
    }
}

fn decide_with_baseline(
    local: Fingerprint<'_>,
    shared: Fingerprint<'_>,
    baseline: (&str, &str),
) -> PathAction {
    let local_changed = local != Some(baseline);
    let shared_changed = shared != Some(baseline);
    match (local_changed, shared_changed) {
        (true, true) if local == shared => PathAction::None,
        (true, true) => PathAction::Conflict,
        (true, false) => PathAction::Outgoing,
        (false, true) => PathAction::Incoming,
        (false, false) => PathAction::None,
    }
}

pub fn analyze(
    local: &[ManifestEntry],
    shared: &[ManifestEntry],
    baseline: &[SyncTrackedEntry],
) -> WorkspaceSyncAnalysis {
    let local_map: BTreeMap<&str, (&str, &str)> = local
        .iter()
        .map(|e| (e.document_path.as_str(), (e.document_hash.as_str(), e.signature_hash.as_str())))
        .collect();
    let shared_map: BTreeMap<&str, (&str, &str)> = shared
        .iter()
        .map(|e| (e.document_path.as_str(), (e.document_hash.as_str(), e.signature_hash.as_str())))
        .collect();
    let baseline_map: BTreeMap<&str, (&str, &str)> = baseline
        .iter()
        .map(|e| (e.path.as_str(), (e.document_hash.as_str(), e.signature_hash.as_str())))
        .collect();

    let paths: BTreeSet<&str> = local_map
        .keys()
        .chain(shared_map.keys())
        .chain(baseline_map.keys())
        .copied()
        .collect();

    let mut out = WorkspaceSyncAnalysis::default();
    for path in paths {
        let local_fp = local_map.get(path).copied();
        let shared_fp = shared_map.get(path).copied();
        let decision = match baseline_map.get(path) {
            Some(&(doc, sig)) => PathDecision::HasBaseline(doc, sig),
            None => PathDecision::NoBaseline,
        };
        let action = match decision {
            PathDecision::NoBaseline => decide_without_baseline(local_fp, shared_fp),
            PathDecision::HasBaseline(doc, sig) => decide_with_baseline(local_fp, shared_fp, (doc, sig)),
        };

        match action {
            PathAction::None => {}
            PathAction::Outgoing => out.outgoing.push(path.to_string()),
            PathAction::Incoming => out.incoming.push(path.to_string()),
            PathAction::Conflict => {
                out.outgoing.push(path.to_string());
                out.incoming.push(path.to_string());
                out.conflicts.push(path.to_string());
            }
        }
    }
    out
}

/// Fingerprints both roots from disk and analyzes them against `baseline`.
pub fn analyze_roots(
    paths: &WorkspacePaths,
    baseline: &[SyncTrackedEntry],
) -> AppResult<WorkspaceSyncAnalysis> {
    let local = build_snapshot(&paths.local_root)?;
    let shared = build_snapshot(&paths.shared_root)?;
    Ok(analyze(&local, &shared, baseline))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, hash: &str) -> ManifestEntry {
        ManifestEntry {
            document_path: path.to_string(),
            document_hash: hash.to_string(),
            signature_path: path.replace(".json", ".sig"),
            signature_hash: format!("sig-{hash}"),
        }
    }

    #[test]
    fn paths_are_reported_in_sorted_order() {
        let local = vec![entry("versions/b.json", "1"), entry("project/a.json", "1")];
        let analysis = analyze(&local, &[], &[]);
        assert_eq!(analysis.outgoing, vec!["project/a.json", "versions/b.json"]);
    }

    #[test]
    fn baseline_only_path_is_not_an_action() {
        let base = tracked_entries(&[entry("project/gone.json", "1")]);
        let analysis = analyze(&[], &[], &base);
        assert_eq!(analysis, WorkspaceSyncAnalysis::default());
    }
}

use bp_core::snapshot::ManifestEntry;
use bp_core::sync_analysis::{analyze, tracked_entries, WorkspaceSyncAnalysis};

fn entry(path: &str, content: &str) -> ManifestEntry {
    ManifestEntry {
        document_path: path.to_string(),
        document_hash: format!("blake3:doc-{content}"),
        signature_path: path.replace(".json", ".sig"),
        signature_hash: format!("blake3:sig-{content}"),
    }
}

fn agreed() -> Vec<ManifestEntry> {
    vec![
        entry("project/members.json", "m1"),
        entry("project/project.json", "p1"),
        entry("versions/v1/version.json", "v1"),
    ]
}

fn with(entries: &[ManifestEntry], path: &str, content: &str) -> Vec<ManifestEntry> {
    entries
        .iter()
        .map(|e| if e.document_path == path { entry(path, content) } else { e.clone() })
        .collect()
}

fn without(entries: &[ManifestEntry], path: &str) -> Vec<ManifestEntry> {
    entries.iter().filter(|e| e.document_path != path).cloned().collect()
}

#[test]
fn identical_fingerprints_yield_nothing() {
    let base = tracked_entries(&agreed());
    let analysis = analyze(&agreed(), &agreed(), &base);
    assert_eq!(analysis, WorkspaceSyncAnalysis::default());
    assert!(!analysis.has_outgoing_changes());
    assert!(!analysis.has_incoming_changes());
    assert!(!analysis.has_conflicts());
}

#[test]
fn local_only_change_is_outgoing() {
    let base = tracked_entries(&agreed());
    let local = with(&agreed(), "project/project.json", "p2");
    let analysis = analyze(&local, &agreed(), &base);
    assert_eq!(analysis.outgoing, vec!["project/project.json"]);
    assert!(analysis.incoming.is_empty());
    assert!(analysis.conflicts.is_empty());
}

#[test]
fn shared_only_change_is_incoming() {
    let base = tracked_entries(&agreed());
    let shared = with(&agreed(), "versions/v1/version.json", "v2");
    let analysis = analyze(&agreed(), &shared, &base);
    assert!(analysis.outgoing.is_empty());
    assert_eq!(analysis.incoming, vec!["versions/v1/version.json"]);
}

#[test]
fn divergent_edits_conflict_and_appear_on_both_sides() {
    let base = tracked_entries(&agreed());
    let local = with(&agreed(), "project/project.json", "mine");
    let shared = with(&agreed(), "project/project.json", "theirs");
    let analysis = analyze(&local, &shared, &base);
    assert_eq!(analysis.conflicts, vec!["project/project.json"]);
    assert_eq!(analysis.outgoing, vec!["project/project.json"]);
    assert_eq!(analysis.incoming, vec!["project/project.json"]);
}

#[test]
fn converged_edits_are_not_a_conflict() {
    let base = tracked_entries(&agreed());
    let both = with(&agreed(), "project/project.json", "same");
    let analysis = analyze(&both, &both, &base);
    assert_eq!(analysis, WorkspaceSyncAnalysis::default());
}

#[test]
fn local_deletion_counts_as_a_change() {
    let base = tracked_entries(&agreed());
    let local = without(&agreed(), "versions/v1/version.json");
    let analysis = analyze(&local, &agreed(), &base);
    assert_eq!(analysis.outgoing, vec!["versions/v1/version.json"]);
    assert!(analysis.conflicts.is_empty());
}

#[test]
fn deletion_against_remote_edit_conflicts() {
    let base = tracked_entries(&agreed());
    let local = without(&agreed(), "versions/v1/version.json");
    let shared = with(&agreed(), "versions/v1/version.json", "v2");
    let analysis = analyze(&local, &shared, &base);
    assert_eq!(analysis.conflicts, vec!["versions/v1/version.json"]);
}

#[test]
fn first_sync_uses_two_way_rule() {
    let local = vec![entry("project/project.json", "p1"), entry("project/local.json", "l")];
    let shared = vec![entry("project/project.json", "p2"), entry("project/remote.json", "r")];
    let analysis = analyze(&local, &shared, &[]);
    assert_eq!(analysis.outgoing, vec!["project/local.json", "project/project.json"]);
    assert_eq!(analysis.incoming, vec!["project/project.json", "project/remote.json"]);
    assert_eq!(analysis.conflicts, vec!["project/project.json"]);
}

#[test]
fn first_sync_of_equal_copies_is_quiet() {
    let analysis = analyze(&agreed(), &agreed(), &[]);
    assert_eq!(analysis, WorkspaceSyncAnalysis::default());
}

#[test]
fn signature_only_change_is_detected() {
    let base = tracked_entries(&agreed());
    let mut local = agreed();
    local[0].signature_hash = "blake3:resigned".to_string();
    let analysis = analyze(&local, &agreed(), &base);
    assert_eq!(analysis.outgoing, vec!["project/members.json"]);
}

use std::path::Path;
use std::process::{Command, Output};

fn run_cli(identity_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bp_cli"))
        .arg("--identity-root")
        .arg(identity_root)
        .args(args)
        .env_remove("BP_SHARED_ROOT")
        .output()
        .expect("run bp_cli")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json stdout")
}

#[test]
fn cli_push_then_pull_into_second_workspace() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");
    let local_a = root.path().join("alice");
    let local_b = root.path().join("bob");
    let shared = root.path().join("shared");
    let (a, b, s) = (
        local_a.to_string_lossy().to_string(),
        local_b.to_string_lossy().to_string(),
        shared.to_string_lossy().to_string(),
    );

    let init = stdout_json(&run_cli(
        &identities,
        &[
            "workspace", "init", &a, "--name", "Demo", "--code", "dm", "--shared-root", &s,
            "--initial-version", "2.1.0", "--now-ms", "100",
        ],
    ));
    assert_eq!(init["project_code"], "DM");
    let version_id = init["versions"][0].as_str().expect("version id").to_string();

    let item = stdout_json(&run_cli(
        &identities,
        &["workspace", "add-item", &a, "--version-id", &version_id, "--title", "First", "--now-ms", "110"],
    ));
    assert_eq!(item["item_key"], "DM-211");

    let push = stdout_json(&run_cli(&identities, &["sync", "push", &a, "--now-ms", "200"]));
    assert_eq!(push["success"], true);
    assert_eq!(push["manifest_version"], 1);
    assert_eq!(push["applied_document_count"], 4);

    let pull = stdout_json(&run_cli(
        &identities,
        &["sync", "pull", &b, "--shared-root", &s, "--now-ms", "300"],
    ));
    assert_eq!(pull["success"], true);
    assert_eq!(pull["applied_document_count"], 4);
    assert!(local_b.join("project/settings.local.json").is_file());

    let trust = stdout_json(&run_cli(&identities, &["trust", "check", &b]));
    assert_eq!(trust["state"], "trusted");

    let status = stdout_json(&run_cli(&identities, &["sync", "status", &b]));
    assert_eq!(status["health"], "idle");
    assert_eq!(status["last_pulled_manifest_version"], 1);

    let verify = stdout_json(&run_cli(&identities, &["sync", "verify", &s]));
    assert_eq!(verify["result"]["is_valid"], true);
    assert_eq!(verify["checked"], 4);
}

#[test]
fn cli_blocked_pull_exits_with_two() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");
    let local_a = root.path().join("alice");
    let shared = root.path().join("shared");
    let (a, s) = (
        local_a.to_string_lossy().to_string(),
        shared.to_string_lossy().to_string(),
    );

    stdout_json(&run_cli(
        &identities,
        &["workspace", "init", &a, "--name", "Demo", "--code", "dm", "--shared-root", &s, "--now-ms", "100"],
    ));
    stdout_json(&run_cli(&identities, &["sync", "push", &a, "--now-ms", "200"]));

    let manifest = shared.join("manifest/sync-manifest.json");
    let text = std::fs::read_to_string(&manifest).expect("read manifest");
    assert!(text.contains("\"created_at_ms\":200"));
    std::fs::write(&manifest, text.replace("\"created_at_ms\":200", "\"created_at_ms\":201"))
        .expect("tamper manifest");

    let pull = run_cli(&identities, &["sync", "pull", &a, "--now-ms", "300"]);
    assert_eq!(pull.status.code(), Some(2));
    let value: serde_json::Value = serde_json::from_slice(&pull.stdout).expect("json stdout");
    assert_eq!(value["success"], false);
}

#[test]
fn cli_reports_missing_shared_root_as_error() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");
    let local = root.path().join("empty").to_string_lossy().to_string();

    let status = run_cli(&identities, &["sync", "status", &local]);
    assert_eq!(status.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&status.stderr);
    assert!(stderr.contains("BP_CONFIG_MISSING"), "stderr: {stderr}");
}

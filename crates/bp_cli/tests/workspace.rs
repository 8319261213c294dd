use std::path::Path;
use std::process::{Command, Output};

fn run_cli(identity_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bp_cli"))
        .arg("--identity-root")
        .arg(identity_root)
        .args(args)
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
fn cli_identity_create_and_list() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");

    let created = stdout_json(&run_cli(&identities, &["identity", "create", "Dana", "--now-ms", "5"]));
    assert_eq!(created["identity"]["display_name"], "Dana");
    assert_eq!(created["identity"]["key_storage_provider"], "plain-file");

    let listed = stdout_json(&run_cli(&identities, &["identity", "list"]));
    let entries = listed["identities"].as_array().expect("identities");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["user_id"], created["identity"]["user_id"]);
}

#[test]
fn cli_workspace_edit_and_show() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");
    let local = root.path().join("local").to_string_lossy().to_string();
    let shared = root.path().join("shared").to_string_lossy().to_string();

    stdout_json(&run_cli(
        &identities,
        &["workspace", "init", &local, "--name", "Demo", "--code", "dm", "--shared-root", &shared, "--now-ms", "100"],
    ));
    let again = run_cli(
        &identities,
        &["workspace", "init", &local, "--name", "Demo", "--code", "dm", "--shared-root", &shared],
    );
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).contains("BP_WORKSPACE_EXISTS"));

    let version = stdout_json(&run_cli(
        &identities,
        &["workspace", "add-version", &local, "--name", "3.0.0", "--status", "in-progress", "--now-ms", "200"],
    ));
    let version_id = version["version_id"].as_str().expect("version id").to_string();

    let bug = stdout_json(&run_cli(
        &identities,
        &[
            "workspace", "add-item", &local, "--version-id", &version_id, "--title", "Crash on save", "--type", "bug",
            "--category", "fixed", "--done", "--now-ms", "210",
        ],
    ));
    assert_eq!(bug["item_key"], "BUG-1");

    let shown = stdout_json(&run_cli(&identities, &["workspace", "show", &local, "--now-ms", "300"]));
    assert_eq!(shown["trust"]["state"], "trusted");
    assert_eq!(shown["project"]["project_code"], "DM");
    assert_eq!(shown["versions"][0]["status"], "in_progress");
    assert_eq!(shown["versions"][0]["items"][0]["is_done"], true);
}

#[test]
fn cli_trust_check_flags_tampered_item() {
    let root = tempfile::tempdir().expect("tempdir");
    let identities = root.path().join("identities");
    let local_root = root.path().join("local");
    let local = local_root.to_string_lossy().to_string();
    let shared = root.path().join("shared").to_string_lossy().to_string();

    let init = stdout_json(&run_cli(
        &identities,
        &[
            "workspace", "init", &local, "--name", "Demo", "--code", "dm", "--shared-root", &shared,
            "--initial-version", "1.0.0", "--now-ms", "100",
        ],
    ));
    let version_id = init["versions"][0].as_str().expect("version id").to_string();
    let item = stdout_json(&run_cli(
        &identities,
        &["workspace", "add-item", &local, "--version-id", &version_id, "--title", "Original", "--now-ms", "110"],
    ));
    let item_id = item["item_id"].as_str().expect("item id");

    let item_path = local_root
        .join("versions")
        .join(&version_id)
        .join("items")
        .join(format!("{item_id}.json"));
    let text = std::fs::read_to_string(&item_path).expect("read item");
    std::fs::write(&item_path, text.replace("Original", "Tampered")).expect("tamper item");

    let check = run_cli(&identities, &["trust", "check", &local]);
    assert_eq!(check.status.code(), Some(2));
    let report: serde_json::Value = serde_json::from_slice(&check.stdout).expect("json stdout");
    assert_eq!(report["state"], "untrusted");

    let edit = run_cli(
        &identities,
        &["workspace", "add-item", &local, "--version-id", &version_id, "--title", "Blocked"],
    );
    assert_eq!(edit.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&edit.stderr).contains("BP_WORKSPACE_UNTRUSTED"));
}

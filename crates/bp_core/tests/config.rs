use bp_core::config::{load_settings, save_settings, settings_path, WorkspaceSettingsV1};
use bp_core::snapshot::build_snapshot;
use std::fs;

#[test]
fn settings_round_trip_and_stay_local() {
    let root = tempfile::tempdir().expect("tempdir");
    let local = root.path().join("local");
    let settings = WorkspaceSettingsV1::new(&root.path().join("shared"), Some("abc123".to_string()));
    save_settings(&local, &settings).expect("save");

    assert_eq!(load_settings(&local).expect("load"), settings);
    assert!(settings_path(&local).ends_with("project/settings.local.json"));
    assert!(build_snapshot(&local).expect("snapshot").is_empty());
}

#[test]
fn missing_settings_are_reported() {
    let root = tempfile::tempdir().expect("tempdir");
    let err = load_settings(root.path()).expect_err("must fail");
    assert_eq!(err.code, "BP_CONFIG_MISSING");
}

#[test]
fn unsupported_settings_version_is_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    let path = settings_path(root.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, br#"{"schema_version": 2, "shared_root": "/tmp/x"}"#).expect("write");

    let err = load_settings(root.path()).expect_err("must fail");
    assert_eq!(err.code, "BP_CONFIG_UNSUPPORTED_VERSION");
}

use super::{print_json, Outcome};
use bp_core::app_error::AppResult;
use bp_core::hashing::key_fingerprint;
use bp_core::identity::{create_identity, list_identities, PlainFileKeyProtector};
use std::path::Path;

pub fn run_create(identity_root: &Path, display_name: &str, now_ms: i64) -> AppResult<Outcome> {
    let created = create_identity(identity_root, display_name, &PlainFileKeyProtector, now_ms)?;
    print_json(&serde_json::json!({
        "status": "ok",
        "identity": created.profile,
        "fingerprint": key_fingerprint(&created.public_key.public_key),
    }));
    Ok(Outcome::Done)
}

pub fn run_list(identity_root: &Path) -> AppResult<Outcome> {
    let identities = list_identities(identity_root)?;
    print_json(&serde_json::json!({
        "identity_root": identity_root,
        "identities": identities,
    }));
    Ok(Outcome::Done)
}

use super::{print_json, resolve_identity, try_load_settings, Outcome};
use bp_core::app_error::AppResult;
use bp_core::signed_store::SignedDocumentStore;
use bp_core::trust::TrustState;
use bp_core::workspace::load_workspace;
use std::path::Path;

pub fn run_check(identity_root: &Path, local_root: &Path, now_ms: i64) -> AppResult<Outcome> {
    let settings = try_load_settings(local_root)?;
    let identity = resolve_identity(identity_root, settings.as_ref(), now_ms)?;
    let report = load_workspace(&SignedDocumentStore::default(), local_root, &identity.public_key, now_ms).trust_report;
    print_json(&report);
    if report.state == TrustState::Trusted {
        Ok(Outcome::Done)
    } else {
        Ok(Outcome::Blocked)
    }
}

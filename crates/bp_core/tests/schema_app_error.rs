use bp_core::app_error::AppError;
use jsonschema::validator_for;
use serde_json::json;

fn app_error_schema() -> serde_json::Value {
    json!({
      "$schema": "https://json-schema.org/draft/2020-12/schema",
      "$id": "bp://schemas/app-error/v1",
      "type": "object",
      "required": [
        "schema_version",
        "code",
        "category",
        "message",
        "retryable",
        "details"
      ],
      "properties": {
        "schema_version": { "const": 1 },
        "code": { "type": "string", "pattern": "^BP_[A-Z0-9_]+$" },
        "category": { "type": "string" },
        "message": { "type": "string" },
        "retryable": { "type": "boolean" },
        "details": {}
      },
      "additionalProperties": false
    })
}

#[test]
fn schema_app_error_accepts_io_failure() {
    let schema = validator_for(&app_error_schema()).expect("compile app_error schema");
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let value = serde_json::to_value(AppError::io(
        "sync",
        "failed copying synchronized file",
        std::path::Path::new("/tmp/shared/project/project.json"),
        &io,
    ))
    .expect("serialize app_error");

    assert!(schema.is_valid(&value));
    assert_eq!(value["code"], "BP_IO_FAILED");
    assert_eq!(value["details"]["error"], "denied");
}

#[test]
fn schema_app_error_rejects_missing_code() {
    let schema = validator_for(&app_error_schema()).expect("compile app_error schema");
    let invalid = json!({
      "schema_version": 1,
      "category": "sync",
      "message": "missing code",
      "retryable": false,
      "details": {}
    });

    assert!(!schema.is_valid(&invalid));
}

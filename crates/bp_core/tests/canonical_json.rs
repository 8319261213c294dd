use bp_core::canon_json::{from_canonical_slice, hash_canonical, to_canonical_bytes, to_canonical_vec};
use bp_core::documents::{ItemDocument, DOCUMENT_SCHEMA_VERSION};
use bp_core::types::{ItemId, ProjectId, UserId, VersionId};

fn sample_item() -> ItemDocument {
    ItemDocument {
        schema_version: DOCUMENT_SCHEMA_VERSION,
        project_id: ProjectId("p1".to_string()),
        version_id: VersionId("v1".to_string()),
        item_id: ItemId("i1".to_string()),
        item_key: "VS-101".to_string(),
        item_type_id: "feature".to_string(),
        category_id: "added".to_string(),
        title: "Offline \"sync\"\n".to_string(),
        description: None,
        is_done: false,
        tags: vec!["b".to_string(), "a".to_string()],
        created_at_ms: 1_700_000_000_000,
        updated_at_ms: 1_700_000_000_001,
        last_modified_by_user_id: UserId("u1".to_string()),
        last_modified_by_name: "Tester".to_string(),
    }
}

#[test]
fn canonical_json_sorts_keys_without_whitespace() {
    let input = serde_json::json!({"b": 2, "a": {"d": [3, 1], "c": null}});
    let got = to_canonical_bytes(&input).expect("canonical bytes");
    assert_eq!(String::from_utf8(got).expect("utf8"), r#"{"a":{"c":null,"d":[3,1]},"b":2}"#);
}

#[test]
fn canonical_json_ignores_insertion_order() {
    let mut first = serde_json::Map::new();
    first.insert("zeta".to_string(), serde_json::json!(1));
    first.insert("alpha".to_string(), serde_json::json!("x"));
    let mut second = serde_json::Map::new();
    second.insert("alpha".to_string(), serde_json::json!("x"));
    second.insert("zeta".to_string(), serde_json::json!(1));

    let a = to_canonical_bytes(&serde_json::Value::Object(first)).expect("first");
    let b = to_canonical_bytes(&serde_json::Value::Object(second)).expect("second");
    assert_eq!(a, b);
}

#[test]
fn canonical_json_float_forbidden() {
    let input = serde_json::json!({"bad": 1.5});
    let err = to_canonical_bytes(&input).expect_err("must reject floats");
    assert_eq!(err.code, "BP_CANON_JSON_FLOAT_FORBIDDEN");
}

#[test]
fn canonical_document_round_trips() {
    let item = sample_item();
    let bytes = to_canonical_vec(&item).expect("serialize");
    let back: ItemDocument = from_canonical_slice(&bytes).expect("deserialize");
    assert_eq!(back, item);
    assert_eq!(to_canonical_vec(&back).expect("reserialize"), bytes);
}

#[test]
fn canonical_json_parse_failure_is_reported() {
    let err = from_canonical_slice::<ItemDocument>(b"{not json").expect_err("must fail");
    assert_eq!(err.code, "BP_CANON_JSON_PARSE_FAILED");
}

#[test]
fn canonical_json_hash_stable() {
    let input = serde_json::json!({"b": 2, "a": [1, 2, 3]});
    let h1 = hash_canonical(&input).expect("hash");
    let h2 = hash_canonical(&input).expect("hash");
    assert_eq!(h1, h2);
    assert!(h1.starts_with("blake3:"));
}

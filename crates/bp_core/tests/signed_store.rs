use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bp_core::signature::{generate_key_pair, Ed25519SignatureService, SignatureService};
use bp_core::signed_store::{signature_path_for, SignedDocumentStore};
use std::fs;
use std::io::Write;

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct Note {
    title: String,
    revision: u32,
}

fn note() -> Note {
    Note {
        title: "release notes".to_string(),
        revision: 3,
    }
}

#[test]
fn write_then_read_verifies() {
    let root = tempfile::tempdir().expect("tempdir");
    let keys = generate_key_pair("tester").expect("keys");
    let store = SignedDocumentStore::default();
    let path = root.path().join("project/note.json");

    let written = store.write(&path, &note(), &keys.signing_key).expect("write");
    assert_eq!(written.signature_path, root.path().join("project/note.sig"));
    assert!(written.signature_path.exists());
    assert_eq!(written.signature.key_id, "tester");

    let read = store.read::<Note>(&path, &keys.public_key).expect("read");
    assert!(read.is_signature_valid);
    assert_eq!(read.document, note());
    assert_eq!(read.canonical_bytes, written.canonical_bytes);
}

#[test]
fn appended_byte_invalidates_signature() {
    let root = tempfile::tempdir().expect("tempdir");
    let keys = generate_key_pair("tester").expect("keys");
    let store = SignedDocumentStore::default();
    let path = root.path().join("note.json");
    store.write(&path, &note(), &keys.signing_key).expect("write");

    let mut file = fs::OpenOptions::new().append(true).open(&path).expect("open");
    file.write_all(b" ").expect("append");
    drop(file);

    let read = store.read::<Note>(&path, &keys.public_key).expect("read still parses");
    assert!(!read.is_signature_valid);
    assert_eq!(read.document, note());
}

#[test]
fn other_key_does_not_verify() {
    let root = tempfile::tempdir().expect("tempdir");
    let signer = generate_key_pair("tester").expect("signer");
    let stranger = generate_key_pair("tester").expect("stranger");
    let store = SignedDocumentStore::default();
    let path = root.path().join("note.json");
    store.write(&path, &note(), &signer.signing_key).expect("write");

    assert!(!store.verify_file(&path, &stranger.public_key).expect("verify"));
    assert!(store.verify_file(&path, &signer.public_key).expect("verify"));
}

#[test]
fn missing_signature_is_an_error_not_unsigned() {
    let root = tempfile::tempdir().expect("tempdir");
    let keys = generate_key_pair("tester").expect("keys");
    let store = SignedDocumentStore::default();
    let path = root.path().join("note.json");
    store.write(&path, &note(), &keys.signing_key).expect("write");
    fs::remove_file(signature_path_for(&path)).expect("remove sig");

    let err = store.read::<Note>(&path, &keys.public_key).expect_err("must fail");
    assert_eq!(err.code, "BP_SIGNATURE_MISSING");
    assert!(err.is_not_found());
}

#[test]
fn missing_document_is_not_found() {
    let root = tempfile::tempdir().expect("tempdir");
    let keys = generate_key_pair("tester").expect("keys");
    let err = SignedDocumentStore::default()
        .read::<Note>(&root.path().join("absent.json"), &keys.public_key)
        .expect_err("must fail");
    assert_eq!(err.code, "BP_DOCUMENT_NOT_FOUND");
}

#[test]
fn undeserializable_document_is_invalid() {
    let root = tempfile::tempdir().expect("tempdir");
    let keys = generate_key_pair("tester").expect("keys");
    let store = SignedDocumentStore::default();
    let path = root.path().join("note.json");
    store
        .write(&path, &serde_json::json!({"unexpected": true}), &keys.signing_key)
        .expect("write");

    let err = store.read::<Note>(&path, &keys.public_key).expect_err("must fail");
    assert_eq!(err.code, "BP_DOCUMENT_INVALID");
}

#[test]
fn signature_fails_on_any_changed_input() {
    let service = Ed25519SignatureService;
    let keys = generate_key_pair("tester").expect("keys");
    let payload = b"payload bytes".to_vec();
    let signature = service.sign(&payload, &keys.signing_key).expect("sign");
    assert!(service.verify(&payload, &signature, &keys.public_key));

    let mut changed_payload = payload.clone();
    changed_payload[0] ^= 1;
    assert!(!service.verify(&changed_payload, &signature, &keys.public_key));

    let mut signature_bytes = BASE64.decode(&signature.signature_base64).expect("decode");
    signature_bytes[10] ^= 1;
    let mut changed_signature = signature.clone();
    changed_signature.signature_base64 = BASE64.encode(&signature_bytes);
    assert!(!service.verify(&payload, &changed_signature, &keys.public_key));

    let mut changed_key = keys.public_key.clone();
    changed_key.public_key[0] ^= 1;
    assert!(!service.verify(&payload, &signature, &changed_key));

    let mut wrong_algorithm = signature.clone();
    wrong_algorithm.algorithm = "RSA".to_string();
    assert!(!service.verify(&payload, &wrong_algorithm, &keys.public_key));
}

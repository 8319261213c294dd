use crate::app_error::{AppError, AppResult};
use crate::hashing::blake3_hex_prefixed;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

fn canon_error(code: &str, message: &str, details: Value) -> AppError {
    AppError::new(code, "canon_json", message, false, details)
}

fn write_canonical(value: &Value, out: &mut String) -> AppResult<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            if n.is_f64() {
                return Err(canon_error(
                    "BP_CANON_JSON_FLOAT_FORBIDDEN",
                    "floats are forbidden in canonical json",
                    serde_json::json!({ "value": n.to_string() }),
                ));
            }
            out.push_str(&n.to_string());
        }
        Value::String(s) => out.push_str(&encode_string(s)?),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Byte-wise key order, independent of how the map was populated.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            out.push('{');
            for (idx, key) in keys.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&encode_string(key)?);
                out.push(':');
                write_canonical(&map[*key], out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn encode_string(s: &str) -> AppResult<String> {
    serde_json::to_string(s).map_err(|e| {
        canon_error(
            "BP_CANON_JSON_ENCODE_FAILED",
            "failed to encode string",
            serde_json::json!({ "error": e.to_string() }),
        )
    })
}

pub fn to_canonical_bytes(value: &Value) -> AppResult<Vec<u8>> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out.into_bytes())
}

/// Serializes any document into the exact byte sequence that gets signed.
pub fn to_canonical_vec<T: Serialize>(document: &T) -> AppResult<Vec<u8>> {
    let value = serde_json::to_value(document).map_err(|e| {
        canon_error(
            "BP_CANON_JSON_ENCODE_FAILED",
            "failed to convert document to json value",
            serde_json::json!({ "error": e.to_string() }),
        )
    })?;
    to_canonical_bytes(&value)
}

pub fn from_canonical_slice<T: DeserializeOwned>(bytes: &[u8]) -> AppResult<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        canon_error(
            "BP_CANON_JSON_PARSE_FAILED",
            "failed to deserialize canonical json",
            serde_json::json!({ "error": e.to_string(), "len": bytes.len() }),
        )
    })
}

pub fn hash_canonical(value: &Value) -> AppResult<String> {
    let bytes = to_canonical_bytes(value)?;
    Ok(blake3_hex_prefixed(&bytes))
}

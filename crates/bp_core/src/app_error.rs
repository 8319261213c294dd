use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub schema_version: u32,
    pub code: String,
    pub category: String,
    pub message: String,
    pub retryable: bool,
    pub details: Value,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: &str, category: &str, message: &str, retryable: bool, details: Value) -> Self {
        Self {
            schema_version: 1,
            code: code.to_string(),
            category: category.to_string(),
            message: message.to_string(),
            retryable,
            details,
        }
    }

    /// Wraps a filesystem failure. I/O errors are never retried by the core.
    pub fn io(category: &str, message: &str, path: &Path, err: &std::io::Error) -> Self {
        Self::new(
            "BP_IO_FAILED",
            category,
            message,
            false,
            json!({ "error": err.to_string(), "path": path }),
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.code == "BP_DOCUMENT_NOT_FOUND" || self.code == "BP_SIGNATURE_MISSING"
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

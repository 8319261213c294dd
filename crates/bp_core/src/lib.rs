pub mod app_error;
pub mod canon_json;
pub mod hashing;
pub mod types;
pub mod signature;
pub mod signed_store;
pub mod documents;
pub mod trust;
pub mod snapshot;
pub mod workspace;
pub mod project;
pub mod identity;
pub mod config;
pub mod sync_analysis;
pub mod sync_manifest;
pub mod sync_state;
pub mod sync;

pub use app_error::AppError;

mod local;

pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    /// Failure reported by a non-filesystem backend. `LocalStore` never
    /// produces it; the fault-injecting stores in the journal tests do.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over the file store that holds photo bytes.
/// Keys are relative paths (`photos/photo_<ms>.jpg`) inside the app's private data area;
/// the bytes are unreachable without an index entry pointing at them.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    /// Whether `key` holds an object. Used by reconcile for records outside the
    /// listed prefix.
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
    /// List every key that starts with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;
}

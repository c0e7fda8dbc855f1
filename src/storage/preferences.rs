use async_trait::async_trait;
use thiserror::Error;

use super::db::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// Failure reported by a store other than redb. The `Database` impl only
    /// produces `Database`; the fault-injecting stores in the journal tests use this.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Durable string key-value store. The photo index is kept under a single key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PreferencesError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError>;
    async fn remove(&self, key: &str) -> Result<(), PreferencesError>;
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, PreferencesError> {
        Ok(self.get_preference(key)?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        Ok(self.set_preference(key, value)?)
    }

    async fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        self.remove_preference(key)?;
        Ok(())
    }
}

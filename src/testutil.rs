//! Shared test helpers for photo-journal handler tests.

use std::sync::Arc;

use crate::config::{Config, JournalConfig, ServerConfig, StorageConfig};
use crate::journal::PhotoJournal;
use crate::object_store::LocalStore;
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            local_storage_path: files_dir.to_string_lossy().to_string(),
            ..Default::default()
        },
        journal: JournalConfig::default(),
        test_mode: true,
        max_upload_size: 1024 * 1024, // 1MB for tests
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store = LocalStore::new(&files_dir).expect("Failed to create test object store");
    let journal = PhotoJournal::new(Arc::new(db), Arc::new(object_store))
        .with_index_key(config.storage.index_key.clone())
        .with_max_source_bytes(config.max_upload_size);

    Arc::new(AppState { config, journal })
}

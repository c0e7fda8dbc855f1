use std::collections::HashSet;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ids::{IdClock, IdStrategy};
use super::models::{PhotoRecord, PurgeStats, ReconcileReport};
use super::source::{ImageSource, SourceError};
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::storage::{KeyValueStore, PreferencesError};

/// Key the index is stored under unless configured otherwise.
pub const DEFAULT_INDEX_KEY: &str = "photo_journal_photos";

/// Object store prefix for photo bytes.
pub const PHOTOS_PREFIX: &str = "photos/";

const UNTITLED: &str = "Untitled";

/// Failure of the underlying key-value or file store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File store error: {0}")]
    Files(#[from] ObjectStoreError),
    #[error("Index store error: {0}")]
    Index(#[from] PreferencesError),
    #[error("Index encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Photo not found: {0}")]
    NotFound(String),
    #[error("Invalid image source: {0}")]
    Source(#[from] SourceError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<ObjectStoreError> for JournalError {
    fn from(e: ObjectStoreError) -> Self {
        JournalError::Storage(e.into())
    }
}

impl From<PreferencesError> for JournalError {
    fn from(e: PreferencesError) -> Self {
        JournalError::Storage(e.into())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(e: serde_json::Error) -> Self {
        JournalError::Storage(e.into())
    }
}

/// The photo record store.
///
/// Every mutation is a full read-modify-write of the index value. Mutations are
/// serialized through `write_lock`; reads never wait on it.
pub struct PhotoJournal {
    preferences: Arc<dyn KeyValueStore>,
    files: Arc<dyn ObjectStore>,
    http: reqwest::Client,
    clock: IdClock,
    id_strategy: IdStrategy,
    index_key: String,
    max_source_bytes: u64,
    write_lock: Mutex<()>,
}

impl PhotoJournal {
    pub fn new(preferences: Arc<dyn KeyValueStore>, files: Arc<dyn ObjectStore>) -> Self {
        Self {
            preferences,
            files,
            http: reqwest::Client::new(),
            clock: IdClock::new(),
            id_strategy: IdStrategy::default(),
            index_key: DEFAULT_INDEX_KEY.to_string(),
            max_source_bytes: u64::MAX,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_index_key(mut self, index_key: impl Into<String>) -> Self {
        self.index_key = index_key.into();
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Largest image a capture handle may resolve to.
    pub fn with_max_source_bytes(mut self, max_source_bytes: u64) -> Self {
        self.max_source_bytes = max_source_bytes;
        self
    }

    pub fn index_key(&self) -> &str {
        &self.index_key
    }

    // ========================================================================
    // Reads (lenient)
    // ========================================================================

    /// All photos, newest first. Read failures are logged and reported as empty.
    pub async fn get_photos(&self) -> Vec<PhotoRecord> {
        match self.load_index().await {
            Ok(photos) => photos,
            Err(e) => {
                warn!(error = %e, key = %self.index_key, "Failed to read photo index");
                Vec::new()
            }
        }
    }

    pub async fn get_photo(&self, id: &str) -> Result<PhotoRecord, JournalError> {
        self.get_photos()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))
    }

    /// Raw image bytes, or `None` if they cannot be read.
    pub async fn read_photo_bytes(&self, file_path: &str) -> Option<Bytes> {
        match self.files.get(file_path).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(error = %e, file_path = %file_path, "Failed to read photo bytes");
                None
            }
        }
    }

    /// Image bytes as a `data:` URL for inline display, or `None` if unreadable.
    pub async fn read_photo_data_url(&self, file_path: &str) -> Option<String> {
        let data = self.read_photo_bytes(file_path).await?;
        let mime = mime_guess::from_path(file_path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());
        Some(format!("data:{mime};base64,{}", STANDARD.encode(&data)))
    }

    // ========================================================================
    // Mutations (strict)
    // ========================================================================

    /// Store the image bytes, then prepend a new record to the index.
    ///
    /// If the index write fails after the bytes were stored, the file is left
    /// orphaned until the next [`reconcile`](Self::reconcile).
    pub async fn add_photo(
        &self,
        source: ImageSource,
        title: &str,
    ) -> Result<PhotoRecord, JournalError> {
        // Resolve the handle before locking so a slow source only stalls this call
        let data = source.read(&self.http, self.max_source_bytes).await?;
        let byte_size = data.len();

        let _guard = self.write_lock.lock().await;

        let tick = self.clock.tick();
        let file_path = format!("{PHOTOS_PREFIX}{}", IdClock::file_name(tick));
        self.files.put(&file_path, data).await?;

        let title = if title.is_empty() { UNTITLED } else { title };
        let record = PhotoRecord {
            id: IdClock::record_id(self.id_strategy, tick),
            file_path,
            title: title.to_string(),
            timestamp: PhotoRecord::format_timestamp(Utc::now()),
            web_path: source.web_path(),
        };

        let result = async {
            let mut photos = self.load_index().await?;
            photos.insert(0, record.clone());
            self.save_index(&photos).await
        }
        .await;

        if let Err(e) = result {
            warn!(
                error = %e,
                file_path = %record.file_path,
                "Index write failed after storing photo; file is orphaned"
            );
            return Err(e);
        }

        debug!(photo_id = %record.id, file_path = %record.file_path, byte_size, "Added photo");
        Ok(record)
    }

    /// Replace the title of the first record matching `id`.
    pub async fn update_photo_title(
        &self,
        id: &str,
        new_title: &str,
    ) -> Result<PhotoRecord, JournalError> {
        let _guard = self.write_lock.lock().await;

        let mut photos = self.load_index().await?;
        let record = photos
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        record.title = new_title.to_string();
        let updated = record.clone();

        self.save_index(&photos).await?;

        debug!(photo_id = %id, "Updated photo title");
        Ok(updated)
    }

    /// Delete the backing file, then drop the record from the index.
    /// A failed file delete leaves the index untouched.
    pub async fn delete_photo(&self, id: &str) -> Result<bool, JournalError> {
        let _guard = self.write_lock.lock().await;

        let mut photos = self.load_index().await?;
        let position = photos
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;

        self.files.delete(&photos[position].file_path).await?;
        let removed = photos.remove(position);
        self.save_index(&photos).await?;

        debug!(photo_id = %id, file_path = %removed.file_path, "Deleted photo");
        Ok(true)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Delete files under the photos prefix that no record points at, and report
    /// records whose file has gone missing.
    pub async fn reconcile(&self) -> Result<ReconcileReport, JournalError> {
        let _guard = self.write_lock.lock().await;

        let photos = self.load_index().await?;
        let stored = self.files.list(PHOTOS_PREFIX).await?;

        let indexed: HashSet<&str> = photos.iter().map(|p| p.file_path.as_str()).collect();
        let present: HashSet<&str> = stored.iter().map(String::as_str).collect();

        let mut report = ReconcileReport {
            scanned: stored.len(),
            ..Default::default()
        };

        for key in stored.iter().filter(|k| !indexed.contains(k.as_str())) {
            match self.files.delete(key).await {
                Ok(()) => report.removed.push(key.clone()),
                Err(e) => warn!(error = %e, file_path = %key, "Failed to remove orphaned file"),
            }
        }

        // Records may point outside the listed prefix; ask the store directly
        for photo in photos.iter().filter(|p| !present.contains(p.file_path.as_str())) {
            if !self.files.exists(&photo.file_path).await.unwrap_or(false) {
                report.missing.push(photo.id.clone());
            }
        }

        info!(
            scanned = report.scanned,
            removed = report.removed.len(),
            missing = report.missing.len(),
            "Reconciled photo store"
        );
        Ok(report)
    }

    /// Remove every photo file and the index itself. For test environments.
    pub async fn purge(&self) -> Result<PurgeStats, JournalError> {
        let _guard = self.write_lock.lock().await;

        let photos = self.get_photos().await;
        let stored = self.files.list(PHOTOS_PREFIX).await?;
        for key in &stored {
            self.files.delete(key).await?;
        }
        self.preferences.remove(&self.index_key).await?;

        Ok(PurgeStats {
            photos: photos.len() as u64,
            files: stored.len() as u64,
        })
    }

    // ========================================================================
    // Index persistence
    // ========================================================================

    async fn load_index(&self) -> Result<Vec<PhotoRecord>, JournalError> {
        match self.preferences.get(&self.index_key).await? {
            Some(value) => Ok(serde_json::from_str(&value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save_index(&self, photos: &[PhotoRecord]) -> Result<(), JournalError> {
        let value = serde_json::to_string(photos)?;
        self.preferences.set(&self.index_key, &value).await?;
        Ok(())
    }
}

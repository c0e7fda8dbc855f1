//! photo-journal - A local photo journal service
//!
//! This crate stores titled photos and serves them back with:
//! - A photo index kept as one JSON value in a redb key-value table
//! - Image bytes in a swappable object store (local filesystem)
//! - Capture handles resolved from uploads, data URLs, local paths or http(s) URIs
//! - REST API with multipart upload support

pub mod api;
pub mod config;
pub mod journal;
pub mod object_store;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use journal::PhotoJournal;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub journal: PhotoJournal,
}

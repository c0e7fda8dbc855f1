//! The photo journal: an ordered index of photo records backed by a key-value
//! store, with the image bytes for each record held in an object store.
//!
//! The index is the sole source of truth for which photos exist. Bytes in the
//! object store without an index entry are orphans; [`PhotoJournal::reconcile`]
//! removes them on demand.

mod ids;
pub mod models;
mod source;
mod store;

pub use ids::{IdClock, IdStrategy};
pub use models::{PhotoRecord, PurgeStats, ReconcileReport};
pub use source::{ImageSource, SourceError, SourcePolicy};
pub use store::{JournalError, PhotoJournal, StorageError, DEFAULT_INDEX_KEY, PHOTOS_PREFIX};

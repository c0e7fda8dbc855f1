pub mod db;
mod preferences;
mod tables;

pub use db::{Database, DatabaseError};
pub use preferences::{KeyValueStore, PreferencesError};
pub use tables::*;

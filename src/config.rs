use std::path::PathBuf;

use thiserror::Error;

use crate::journal::{IdStrategy, SourcePolicy, DEFAULT_INDEX_KEY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub journal: JournalConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Directory holding the redb key-value database
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory of the photo file store
    pub local_storage_path: String,
    /// Key-value key the photo index is stored under
    pub index_key: String,
}

#[derive(Debug, Clone)]
pub struct JournalConfig {
    pub id_strategy: IdStrategy,
    /// Longest title accepted from clients, in characters
    pub max_title_length: usize,
    /// Directory that `source` file handles must resolve into. Unset disables them.
    pub capture_dir: Option<String>,
    /// Whether `source` may name an http(s) URL for the server to fetch
    pub allow_remote_sources: bool,
}

impl JournalConfig {
    /// Which capture handles clients may submit in the `source` field.
    pub fn source_policy(&self) -> SourcePolicy {
        SourcePolicy {
            capture_dir: self.capture_dir.as_ref().map(PathBuf::from),
            allow_remote: self.allow_remote_sources,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_storage_path: "./data/files".to_string(),
            index_key: DEFAULT_INDEX_KEY.to_string(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Timestamp,
            max_title_length: 100,
            capture_dir: None,
            allow_remote_sources: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let local_storage_path = std::env::var("LOCAL_STORAGE_PATH")
            .unwrap_or_else(|_| format!("{}/files", data_dir.trim_end_matches('/')));

        let index_key =
            std::env::var("INDEX_KEY").unwrap_or_else(|_| DEFAULT_INDEX_KEY.to_string());

        let id_strategy = match std::env::var("ID_STRATEGY") {
            Ok(value) => IdStrategy::parse(&value).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "ID_STRATEGY must be 'timestamp' or 'uuid', got '{value}'"
                ))
            })?,
            Err(_) => IdStrategy::Timestamp,
        };

        let max_title_length = std::env::var("MAX_TITLE_LENGTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        let capture_dir = std::env::var("CAPTURE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let allow_remote_sources = std::env::var("ALLOW_REMOTE_SOURCES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(20 * 1024 * 1024); // 20MB

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
            },
            storage: StorageConfig {
                local_storage_path,
                index_key,
            },
            journal: JournalConfig {
                id_strategy,
                max_title_length,
                capture_dir,
                allow_remote_sources,
            },
            test_mode,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.index_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "INDEX_KEY cannot be empty".to_string(),
            ));
        }

        if self.journal.max_title_length == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_TITLE_LENGTH must be greater than 0".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.journal.allow_remote_sources {
            tracing::warn!("ALLOW_REMOTE_SOURCES is enabled. The server will fetch client-supplied URLs.");
        }

        if self.test_mode {
            tracing::warn!("TEST_MODE is enabled. Do not run this configuration in production.");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            journal: JournalConfig::default(),
            test_mode: false,
            max_upload_size: 1024,
        }
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_empty_index_key_rejected() {
        let mut config = base_config();
        config.storage.index_key = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_title_length_rejected() {
        let mut config = base_config();
        config.journal.max_title_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_policy_locked_down_by_default() {
        let policy = base_config().journal.source_policy();
        assert!(policy.capture_dir.is_none());
        assert!(!policy.allow_remote);
    }

    #[test]
    fn test_source_policy_from_journal_config() {
        let mut config = base_config();
        config.journal.capture_dir = Some("/var/lib/photo-journal/capture".to_string());
        config.journal.allow_remote_sources = true;

        let policy = config.journal.source_policy();
        assert_eq!(
            policy.capture_dir,
            Some(PathBuf::from("/var/lib/photo-journal/capture"))
        );
        assert!(policy.allow_remote);
    }
}

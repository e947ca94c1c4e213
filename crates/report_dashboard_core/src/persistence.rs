//! crates/report_dashboard_core/src/persistence.rs
//!
//! Typed JSON access to the dashboard's local key-value storage.
//!
//! Every piece of client state lives under its own key: the report list, the
//! "initialized" flag, a revision stamp for the report list, the current user,
//! the theme preference, and the activity log.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::domain::Report;
use crate::ports::{KeyValueStorage, PortError, PortResult};

pub const DEFAULT_REPORTS_KEY: &str = "ai-dashboard-reports";
pub const DEFAULT_INIT_KEY: &str = "ai-dashboard-reports-initialized";
pub const DEFAULT_USER_KEY: &str = "app_user";
pub const THEME_KEY: &str = "preferred-theme";
pub const ACTIVITY_KEY: &str = "app_activities";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
    #[error("Malformed value under '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The storage keys used by one dashboard instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub reports: String,
    pub initialized: String,
    pub revision: String,
    pub user: String,
    pub theme: String,
    pub activities: String,
}

impl StorageKeys {
    /// Builds the key set around a custom report-list key. The revision key is
    /// derived from it so two lists never share a stamp.
    pub fn new(reports_key: &str, init_key: &str, user_key: &str) -> Self {
        Self {
            reports: reports_key.to_string(),
            initialized: init_key.to_string(),
            revision: format!("{}-revision", reports_key),
            user: user_key.to_string(),
            theme: THEME_KEY.to_string(),
            activities: ACTIVITY_KEY.to_string(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new(DEFAULT_REPORTS_KEY, DEFAULT_INIT_KEY, DEFAULT_USER_KEY)
    }
}

/// Reads and writes typed values over a [`KeyValueStorage`].
#[derive(Clone)]
pub struct LocalPersistence {
    storage: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
}

impl LocalPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>, keys: StorageKeys) -> Self {
        Self { storage, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Returns `None` when nothing has been stored under `key` yet.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.storage.get_item(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| PersistenceError::Malformed {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(value).map_err(|source| PersistenceError::Malformed {
            key: key.to_string(),
            source,
        })?;
        self.storage.set_item(key, &raw)?;
        Ok(())
    }

    pub fn load_raw(&self, key: &str) -> PortResult<Option<String>> {
        self.storage.get_item(key)
    }

    pub fn save_raw(&self, key: &str, value: &str) -> PortResult<()> {
        self.storage.set_item(key, value)
    }

    pub fn load_reports(&self) -> Result<Option<Vec<Report>>, PersistenceError> {
        self.load_json(&self.keys.reports)
    }

    pub fn save_reports(&self, reports: &[Report]) -> Result<(), PersistenceError> {
        self.save_json(&self.keys.reports, reports)
    }

    pub fn is_initialized(&self) -> PortResult<bool> {
        Ok(self.storage.get_item(&self.keys.initialized)?.as_deref() == Some("true"))
    }

    pub fn mark_initialized(&self) -> PortResult<()> {
        self.storage.set_item(&self.keys.initialized, "true")
    }

    /// The revision stamp of the persisted report list; 0 if never written.
    pub fn revision(&self) -> PortResult<u64> {
        let raw = self.storage.get_item(&self.keys.revision)?;
        Ok(match raw {
            None => 0,
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable revision stamp '{}'", value);
                0
            }),
        })
    }

    pub fn set_revision(&self, revision: u64) -> PortResult<()> {
        self.storage.set_item(&self.keys.revision, &revision.to_string())
    }
}

/// A process-local [`KeyValueStorage`], used by tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get_item(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> PortResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

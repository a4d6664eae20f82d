//! Key/value blob storage

use std::collections::HashMap;
use std::sync::Arc;

use libsql::params;
use tokio::sync::Mutex;

use super::Database;
use crate::error::Result;

/// A single-key blob medium, the on-device storage behind the local adapter
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// libSQL implementation of `KeyValueStore`
pub struct LibSqlKeyValueStore {
    db: Database,
}

impl LibSqlKeyValueStore {
    /// Create a store backed by an opened database
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) a store at the given path
    pub async fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path).await?))
    }

    /// Open an in-memory store
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?))
    }
}

impl KeyValueStore for LibSqlKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .db
            .connection()
            .query("SELECT value FROM kv_store WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
                params![key, value, now],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv_store WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}

/// Process-local `KeyValueStore`; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, Result};

/// Key-value persistence collaborator. The production implementation is
/// SQLite-backed; tests use the in-memory map.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Load a persisted value, returning `fallback` when nothing is stored
/// under `key`. Read or deserialize failure is a `CoreError::Storage`.
pub fn load<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
    fallback: T,
) -> Result<T> {
    load_with(storage, key, fallback, |raw| {
        serde_json::from_str(raw).context("deserialize failed")
    })
}

/// `load` with an explicit deserializer for non-JSON-safe types.
pub fn load_with<T>(
    storage: &dyn KeyValueStorage,
    key: &str,
    fallback: T,
    deserialize: impl FnOnce(&str) -> anyhow::Result<T>,
) -> Result<T> {
    let raw = storage.get(key).map_err(|source| CoreError::Storage {
        key: key.to_string(),
        source,
    })?;
    match raw {
        Some(raw) => deserialize(&raw).map_err(|source| CoreError::Storage {
            key: key.to_string(),
            source,
        }),
        None => Ok(fallback),
    }
}

/// Persist a value under `key`, JSON-encoded.
pub fn save<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, value: &T) -> Result<()> {
    save_with(storage, key, value, |v| {
        serde_json::to_string(v).context("serialize failed")
    })
}

/// `save` with an explicit serializer for non-JSON-safe types.
pub fn save_with<T>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
    serialize: impl FnOnce(&T) -> anyhow::Result<String>,
) -> Result<()> {
    let encoded = serialize(value).map_err(|source| CoreError::Storage {
        key: key.to_string(),
        source,
    })?;
    storage
        .set(key, &encoded)
        .map_err(|source| CoreError::Storage {
            key: key.to_string(),
            source,
        })
}

/// Remove any value stored under `key`. Removing an absent key is not an
/// error.
pub fn remove(storage: &dyn KeyValueStorage, key: &str) -> Result<()> {
    storage.remove(key).map_err(|source| CoreError::Storage {
        key: key.to_string(),
        source,
    })
}

/// SQLite-backed key-value storage. One row per key in a `kv_store` table;
/// `updated_at` is refreshed on every write.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open storage database: {}", path.display()))?;
        let storage = SqliteStorage {
            conn: Mutex::new(conn),
        };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = SqliteStorage {
            conn: Mutex::new(conn),
        };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("storage connection mutex poisoned"))
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory key-value storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let map = self
            .map
            .lock()
            .map_err(|_| anyhow!("memory storage mutex poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| anyhow!("memory storage mutex poisoned"))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| anyhow!("memory storage mutex poisoned"))?;
        map.remove(key);
        Ok(())
    }
}

//! Key-value blob persistence behind the history store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use tracing::info;

use crate::error::EquipScopeError;

/// Storage port: whatever bytes were last saved under a key come back from `load`.
pub trait BlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, EquipScopeError>;
    fn save(&self, key: &str, value: &[u8]) -> Result<(), EquipScopeError>;
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one blob.
    pub fn with_blob(key: &str, value: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        if let Ok(mut blobs) = store.blobs.lock() {
            blobs.insert(key.to_string(), value.into());
        }
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, EquipScopeError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| EquipScopeError::Storage("Memory store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), EquipScopeError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| EquipScopeError::Storage("Memory store lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// SQLite-backed blob store: one row per key.
/// All operations are synchronous (rusqlite is blocking).
/// Callers in async contexts should use `tokio::task::spawn_blocking`.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Create or open the blob database at `db_path`, creating its parent directory.
    pub fn new(db_path: &Path) -> Result<Self, EquipScopeError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EquipScopeError::Storage(format!("Failed to create data dir: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            EquipScopeError::Storage(format!(
                "Failed to open history database at {:?}: {}",
                db_path, e
            ))
        })?;
        let store = Self::with_connection(conn)?;

        info!("Opened history database at {:?}", db_path);
        Ok(store)
    }

    /// Open an existing database without creating the file, its directory,
    /// or the blobs table. Writes through this store fail.
    pub fn open_read_only(db_path: &Path) -> Result<Self, EquipScopeError> {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| {
                EquipScopeError::Storage(format!(
                    "Failed to open history database at {:?} read-only: {}",
                    db_path, e
                ))
            })?;
        Ok(Self { conn })
    }

    /// Non-persistent database, mainly for tests.
    pub fn in_memory() -> Result<Self, EquipScopeError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            EquipScopeError::Storage(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, EquipScopeError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| EquipScopeError::Storage(format!("Failed to create blobs table: {}", e)))?;

        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, EquipScopeError> {
        let result = self.conn.query_row(
            "SELECT value FROM blobs WHERE key = ?1",
            params![key],
            |row| row.get::<_, Vec<u8>>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(EquipScopeError::Storage(format!(
                "Blob lookup failed for '{}': {}",
                key, e
            ))),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), EquipScopeError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| {
                EquipScopeError::Storage(format!("Failed to store blob '{}': {}", key, e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_missing_key() {
        let store = MemoryBlobStore::new();
        assert!(store.load("absent").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_save_and_load() {
        let store = MemoryBlobStore::new();
        store.save("k", b"first").unwrap();
        store.save("k", b"second").unwrap();
        assert_eq!(store.load("k").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_memory_store_seeded() {
        let store = MemoryBlobStore::with_blob("k", "seeded");
        assert_eq!(store.load("k").unwrap(), Some(b"seeded".to_vec()));
    }

    #[test]
    fn test_sqlite_store_round_trip_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.db");

        {
            let store = SqliteBlobStore::new(&path).unwrap();
            assert!(store.load("equip_history").unwrap().is_none());
            store.save("equip_history", b"[]").unwrap();
        }

        // Reopen to check persistence
        let store = SqliteBlobStore::new(&path).unwrap();
        assert_eq!(store.load("equip_history").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn test_sqlite_read_only_never_creates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("history.db");

        assert!(SqliteBlobStore::open_read_only(&path).is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_sqlite_read_only_reads_but_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");
        SqliteBlobStore::new(&path)
            .unwrap()
            .save("equip_history", b"[]")
            .unwrap();

        let store = SqliteBlobStore::open_read_only(&path).unwrap();
        assert_eq!(store.load("equip_history").unwrap(), Some(b"[]".to_vec()));
        assert!(store.save("equip_history", b"[1]").is_err());
    }

    #[test]
    fn test_sqlite_store_overwrites() {
        let store = SqliteBlobStore::in_memory().unwrap();
        store.save("k", b"one").unwrap();
        store.save("k", b"two").unwrap();
        store.save("other", b"three").unwrap();
        assert_eq!(store.load("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.load("other").unwrap(), Some(b"three".to_vec()));
    }
}

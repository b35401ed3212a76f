//! SQLite key-value store adapter.

use crate::domain::error::LedgerError;
use crate::ports::storage_port::KeyValueStore;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use std::path::Path;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, LedgerError> {
        self.pool.get().map_err(|e: r2d2::Error| LedgerError::Storage {
            reason: e.to_string(),
        })
    }

    fn initialize_schema(&self) -> Result<(), LedgerError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| LedgerError::Storage {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let conn = self.connection()?;
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e: rusqlite::Error| LedgerError::Storage {
            reason: e.to_string(),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e: rusqlite::Error| LedgerError::Storage {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), LedgerError> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e: rusqlite::Error| LedgerError::Storage {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

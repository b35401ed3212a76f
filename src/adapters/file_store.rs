//! Directory-backed key-value store: one file per key.

use crate::domain::error::LedgerError;
use crate::ports::storage_port::KeyValueStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` for storage, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| LedgerError::Storage {
            reason: format!("failed to create {}: {}", dir.display(), e),
        })?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, LedgerError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(LedgerError::Storage {
                reason: format!("invalid key {key:?}"),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::Storage {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| LedgerError::Storage {
                reason: format!("failed to write {}: {}", path.display(), e),
            })
    }

    fn delete(&self, key: &str) -> Result<(), LedgerError> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LedgerError::Storage {
                reason: format!("failed to delete {}: {}", path.display(), e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("ledger.cash").unwrap(), None);
    }

    #[test]
    fn set_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("ledger.cash", "1000000").unwrap();
        assert!(dir.path().join("ledger.cash.json").exists());
        assert_eq!(store.get("ledger.cash").unwrap().as_deref(), Some("1000000"));

        store.delete("ledger.cash").unwrap();
        assert_eq!(store.get("ledger.cash").unwrap(), None);
        assert!(store.delete("ledger.cash").is_ok());
    }

    #[test]
    fn creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        store.set("k", "v").unwrap();
        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(store.get(key), Err(LedgerError::Storage { .. })));
        }
    }
}

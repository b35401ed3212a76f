//! In-memory key-value store.

use crate::domain::error::LedgerError;
use crate::ports::storage_port::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// `HashMap`-backed store. Clones share the same contents, so a test can
/// hand one clone to a ledger and inspect or reopen through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), LedgerError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        b.delete("k").unwrap();
        assert!(a.is_empty());
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nothing").is_ok());
        assert_eq!(store.len(), 0);
    }
}

//! Durable key-value storage port.

use crate::domain::error::LedgerError;

/// String-keyed, string-valued durable storage. Keys are independent
/// records; there is no atomicity across keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, LedgerError>;

    fn set(&self, key: &str, value: &str) -> Result<(), LedgerError>;

    /// Removing a key that does not exist is not an error.
    fn delete(&self, key: &str) -> Result<(), LedgerError>;
}

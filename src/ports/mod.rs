//! Port traits: the capabilities the ledger core consumes from its host.

pub mod config_port;
pub mod observer_port;
pub mod quote_port;
pub mod storage_port;

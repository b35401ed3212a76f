//! Concrete adapter implementations for ports.

pub mod csv_catalog_adapter;
pub mod file_config_adapter;
pub mod file_store;
pub mod fmp_quote_adapter;
pub mod memory_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;

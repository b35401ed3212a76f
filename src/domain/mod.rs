//! Core domain types and logic.

pub mod catalog;
pub mod error;
pub mod events;
pub mod execution;
pub mod ledger;
pub mod performance;
pub mod position;
pub mod quotes;
pub mod settings;
pub mod shared;
pub mod trade;

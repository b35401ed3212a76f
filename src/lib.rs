//! paperledger: portfolio ledger and performance engine for paper trading.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and a thin command-line host in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

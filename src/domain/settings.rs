//! Typed application settings and their validation.

use std::path::PathBuf;

use super::error::LedgerError;
use super::ledger::DEFAULT_INITIAL_CASH;
use super::quotes::DEFAULT_CHUNK_SIZE;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_QUOTES_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";
pub const DEFAULT_LOOKBACK_WEEKS: u32 = 2;
pub const DEFAULT_POOL_SIZE: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Memory,
    File { dir: PathBuf },
    Sqlite { path: PathBuf, pool_size: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub lookback_weeks: u32,
    pub chunk_size: usize,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        QuoteSettings {
            api_key: None,
            base_url: DEFAULT_QUOTES_BASE_URL.to_string(),
            lookback_weeks: DEFAULT_LOOKBACK_WEEKS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub initial_cash: f64,
    pub storage: StorageBackend,
    pub quotes: QuoteSettings,
    pub catalog_path: Option<PathBuf>,
}

fn invalid(section: &str, key: &str, reason: &str) -> LedgerError {
    LedgerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn required_path(config: &dyn ConfigPort, section: &str, key: &str) -> Result<PathBuf, LedgerError> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| LedgerError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LedgerError> {
        let initial_cash = config.get_double("ledger", "initial_cash", DEFAULT_INITIAL_CASH);
        if !(initial_cash.is_finite() && initial_cash > 0.0) {
            return Err(invalid(
                "ledger",
                "initial_cash",
                "initial_cash must be a positive number",
            ));
        }

        Ok(Settings {
            initial_cash,
            storage: storage_from_config(config)?,
            quotes: quotes_from_config(config)?,
            catalog_path: config
                .get_string("catalog", "path")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn storage_from_config(config: &dyn ConfigPort) -> Result<StorageBackend, LedgerError> {
    let backend = config
        .get_string("storage", "backend")
        .unwrap_or_else(|| "file".to_string())
        .trim()
        .to_lowercase();

    match backend.as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "file" => Ok(StorageBackend::File {
            dir: required_path(config, "storage", "path")?,
        }),
        "sqlite" => {
            let pool_size = config.get_int("storage", "pool_size", DEFAULT_POOL_SIZE as i64);
            if !(1..=64).contains(&pool_size) {
                return Err(invalid(
                    "storage",
                    "pool_size",
                    "pool_size must be between 1 and 64",
                ));
            }
            Ok(StorageBackend::Sqlite {
                path: required_path(config, "storage", "path")?,
                pool_size: pool_size as u32,
            })
        }
        _ => Err(invalid(
            "storage",
            "backend",
            "backend must be one of: file, sqlite, memory",
        )),
    }
}

fn quotes_from_config(config: &dyn ConfigPort) -> Result<QuoteSettings, LedgerError> {
    let lookback_weeks = config.get_int("quotes", "lookback_weeks", DEFAULT_LOOKBACK_WEEKS as i64);
    if !(1..=520).contains(&lookback_weeks) {
        return Err(invalid(
            "quotes",
            "lookback_weeks",
            "lookback_weeks must be between 1 and 520",
        ));
    }
    let chunk_size = config.get_int("quotes", "chunk_size", DEFAULT_CHUNK_SIZE as i64);
    if chunk_size < 1 {
        return Err(invalid("quotes", "chunk_size", "chunk_size must be at least 1"));
    }

    Ok(QuoteSettings {
        api_key: config
            .get_string("quotes", "api_key")
            .filter(|s| !s.trim().is_empty()),
        base_url: config
            .get_string("quotes", "base_url")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_QUOTES_BASE_URL.to_string()),
        lookback_weeks: lookback_weeks as u32,
        chunk_size: chunk_size as usize,
    })
}

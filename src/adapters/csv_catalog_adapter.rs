//! CSV reference-table adapter for the equity catalog.
//!
//! Expects a header row naming `Symbol`, `Security`, `GICS Sector` and
//! `GICS Sub-Industry`; column order and extra columns don't matter.

use crate::domain::catalog::{Catalog, CatalogEntry};
use crate::domain::error::LedgerError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const SYMBOL: &str = "Symbol";
const SECURITY: &str = "Security";
const SECTOR: &str = "GICS Sector";
const SUB_INDUSTRY: &str = "GICS Sub-Industry";

pub struct CsvCatalogAdapter;

impl CsvCatalogAdapter {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Catalog, LedgerError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| LedgerError::Catalog {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Catalog, LedgerError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| LedgerError::Catalog {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LedgerError::Catalog {
                    reason: format!("missing {name} column"),
                })
        };
        let symbol_idx = column(SYMBOL)?;
        let name_idx = column(SECURITY)?;
        let sector_idx = column(SECTOR)?;
        let sub_idx = column(SUB_INDUSTRY)?;

        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| LedgerError::Catalog {
                reason: format!("CSV parse error: {}", e),
            })?;

            let field = |idx: usize| record.get(idx).filter(|v| !v.is_empty());
            let (Some(symbol), Some(name), Some(sector), Some(sub_industry)) = (
                field(symbol_idx),
                field(name_idx),
                field(sector_idx),
                field(sub_idx),
            ) else {
                continue;
            };

            entries.push(CatalogEntry {
                symbol: symbol.to_string(),
                name: name.to_string(),
                sector: sector.to_string(),
                sub_industry: sub_industry.to_string(),
            });
        }

        Ok(Catalog::from_entries(entries))
    }
}

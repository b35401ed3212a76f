//! Equity catalog grouped by sector and sub-industry.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub sub_industry: String,
}

/// Symbols indexed by category. Every symbol appears under both its sector
/// and its sub-industry, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<String>>,
    names: HashMap<String, String>,
    symbols: Vec<String>,
}

impl Catalog {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Catalog::default();
        for entry in entries {
            if !catalog.names.contains_key(&entry.symbol) {
                catalog.symbols.push(entry.symbol.clone());
            }
            catalog
                .names
                .insert(entry.symbol.clone(), entry.name.clone());
            catalog
                .categories
                .entry(entry.sector)
                .or_default()
                .push(entry.symbol.clone());
            catalog
                .categories
                .entry(entry.sub_industry)
                .or_default()
                .push(entry.symbol);
        }
        catalog
    }

    /// Sorted category names.
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn tickers(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Display name for `symbol`, or the symbol itself when unknown.
    pub fn name_of<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.names.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.names.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols whose ticker or name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.symbols
            .iter()
            .filter(|symbol| {
                symbol.to_lowercase().contains(&needle)
                    || self.name_of(symbol).to_lowercase().contains(&needle)
            })
            .map(String::as_str)
            .collect()
    }
}

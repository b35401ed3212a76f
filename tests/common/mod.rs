#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use paperledger::adapters::memory_store::MemoryStore;
use paperledger::domain::error::LedgerError;
use paperledger::domain::events::LedgerEvent;
use paperledger::domain::ledger::{LedgerStore, DEFAULT_INITIAL_CASH};
pub use paperledger::domain::quotes::PricePoint;
use paperledger::ports::observer_port::LedgerObserver;
use paperledger::ports::quote_port::QuoteFeed;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Quote feed serving canned histories. `per_call` caps how many symbols a
/// single request answers, to exercise the retry path.
pub struct MockQuoteFeed {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub failing: HashSet<String>,
    pub per_call: usize,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl MockQuoteFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failing: HashSet::new(),
            per_call: usize::MAX,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_closes(mut self, ticker: &str, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: day(i as u32 + 1),
                close,
            })
            .collect();
        self.data.insert(ticker.to_string(), points);
        self
    }

    /// Any request containing `ticker` fails.
    pub fn with_failure(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_string());
        self
    }

    pub fn answering_at_most(mut self, per_call: usize) -> Self {
        self.per_call = per_call;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl QuoteFeed for MockQuoteFeed {
    fn fetch_history(
        &self,
        tickers: &[String],
        _lookback_days: u32,
    ) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError> {
        self.calls.borrow_mut().push(tickers.to_vec());
        if let Some(bad) = tickers.iter().find(|t| self.failing.contains(*t)) {
            return Err(LedgerError::QuoteFeed {
                reason: format!("upstream refused {bad}"),
            });
        }
        Ok(tickers
            .iter()
            .filter_map(|t| self.data.get(t).map(|h| (t.clone(), h.clone())))
            .take(self.per_call)
            .collect())
    }
}

/// Observer that keeps every event it sees. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }
}

impl LedgerObserver for RecordingObserver {
    fn on_ledger_event(&self, event: &LedgerEvent) {
        self.events.lock().push(event.clone());
    }
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

/// 14:00 UTC on the given day of January 2024.
pub fn ts(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 14, 0, 0).unwrap()
}

pub fn ts_ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 14, 0, 0).unwrap()
}

/// A ledger over a fresh memory store, plus a handle on that store.
pub fn fresh_ledger() -> (LedgerStore, MemoryStore) {
    let store = MemoryStore::new();
    let ledger = LedgerStore::open(Box::new(store.clone()), DEFAULT_INITIAL_CASH);
    (ledger, store)
}

/// A ledger with a recording observer attached.
pub fn observed_ledger() -> (LedgerStore, MemoryStore, RecordingObserver) {
    let (mut ledger, store) = fresh_ledger();
    let observer = RecordingObserver::default();
    ledger.subscribe(Box::new(observer.clone()));
    (ledger, store, observer)
}

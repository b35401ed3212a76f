//! Ledger aggregate and its persistence-backed store.
//!
//! [`Ledger`] is plain state: positions, cash and the append-only trade log.
//! [`LedgerStore`] owns one, mirrors it into a [`KeyValueStore`] and fans out
//! change notifications. Trade execution lives in [`super::execution`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, error, warn};

use super::error::LedgerError;
use super::events::LedgerEvent;
use super::performance::{self, PerformanceReport};
use super::position::Position;
use super::trade::TradeRecord;
use crate::ports::observer_port::LedgerObserver;
use crate::ports::storage_port::KeyValueStore;

pub const DEFAULT_INITIAL_CASH: f64 = 1_000_000.0;

pub const POSITIONS_KEY: &str = "ledger.positions";
pub const TRADES_KEY: &str = "ledger.trades";
pub const CASH_KEY: &str = "ledger.cash";

/// Mark-to-market snapshot over open positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Valuation {
    pub market_value: f64,
    pub unrealized_pl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub positions: HashMap<String, Position>,
    pub cash: f64,
    pub trades: Vec<TradeRecord>,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Ledger {
            positions: HashMap::new(),
            cash: initial_cash,
            trades: Vec::new(),
        }
    }

    /// Market value and unrealized P/L summed over positions with shares held.
    pub fn current_value(&self) -> Valuation {
        self.positions
            .values()
            .filter(|pos| pos.is_open())
            .fold(Valuation::default(), |acc, pos| Valuation {
                market_value: acc.market_value + pos.market_value(),
                unrealized_pl: acc.unrealized_pl + pos.unrealized_pl(),
            })
    }

    /// Realized P/L carried by the most recent trade, 0 for an empty log.
    pub fn last_cumulative_pl(&self) -> f64 {
        self.trades.last().map(|t| t.cumulative_pl).unwrap_or(0.0)
    }

    /// Positions with shares held, sorted by ticker.
    pub fn open_positions(&self) -> Vec<&Position> {
        let mut open: Vec<&Position> = self.positions.values().filter(|p| p.is_open()).collect();
        open.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        open
    }
}

pub struct LedgerStore {
    store: Box<dyn KeyValueStore + Send>,
    pub(crate) ledger: Ledger,
    initial_cash: f64,
    observers: Vec<Box<dyn LedgerObserver + Send>>,
}

impl LedgerStore {
    /// A store holding a fresh ledger. Nothing is read from `store` until
    /// [`LedgerStore::load`].
    pub fn new(store: Box<dyn KeyValueStore + Send>, initial_cash: f64) -> Self {
        LedgerStore {
            store,
            ledger: Ledger::new(initial_cash),
            initial_cash,
            observers: Vec::new(),
        }
    }

    /// Construct and immediately load persisted state.
    pub fn open(store: Box<dyn KeyValueStore + Send>, initial_cash: f64) -> Self {
        let mut ledger_store = Self::new(store, initial_cash);
        ledger_store.load();
        ledger_store
    }

    pub fn subscribe(&mut self, observer: Box<dyn LedgerObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.ledger.trades
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.ledger.positions
    }

    pub fn position(&self, ticker: &str) -> Option<&Position> {
        self.ledger.positions.get(ticker)
    }

    pub fn open_positions(&self) -> Vec<&Position> {
        self.ledger.open_positions()
    }

    pub fn current_value(&self) -> Valuation {
        self.ledger.current_value()
    }

    pub fn analyze(&self) -> PerformanceReport {
        performance::analyze(
            &self.ledger.trades,
            &self.ledger.positions,
            self.ledger.cash,
            self.initial_cash,
        )
    }

    /// Replace in-memory state with whatever is persisted. Each key that is
    /// missing, unreadable or unparseable falls back to its initial value.
    pub fn load(&mut self) {
        let positions: HashMap<String, Position> = self.read_key(POSITIONS_KEY).unwrap_or_default();
        let trades: Vec<TradeRecord> = self.read_key(TRADES_KEY).unwrap_or_default();
        let cash = self
            .read_key::<f64>(CASH_KEY)
            .filter(|c| c.is_finite())
            .unwrap_or(self.initial_cash);

        debug!(
            positions = positions.len(),
            trades = trades.len(),
            cash,
            "ledger loaded"
        );
        self.ledger = Ledger {
            positions,
            cash,
            trades,
        };
    }

    /// Write positions, trade log and cash to durable storage.
    pub fn save(&self) -> Result<(), LedgerError> {
        self.write_key(POSITIONS_KEY, &self.ledger.positions)?;
        self.write_key(TRADES_KEY, &self.ledger.trades)?;
        self.write_key(CASH_KEY, &self.ledger.cash)?;
        Ok(())
    }

    /// Reset to an empty ledger with the initial cash and persist the reset.
    pub fn clear(&mut self) {
        self.ledger = Ledger::new(self.initial_cash);
        let result = self
            .store
            .delete(POSITIONS_KEY)
            .and_then(|_| self.store.delete(TRADES_KEY))
            .and_then(|_| self.write_key(CASH_KEY, &self.ledger.cash));
        if let Err(e) = result {
            error!(error = %e, "failed to persist ledger reset");
        }
        self.notify(&LedgerEvent::Cleared);
    }

    /// Refresh mark prices for positions already in the ledger. Unknown
    /// tickers and non-positive prices are ignored. Returns how many
    /// positions were updated.
    pub fn mark_prices(&mut self, prices: &HashMap<String, f64>) -> usize {
        let mut marked: Vec<String> = Vec::new();
        for (ticker, &price) in prices {
            if !(price.is_finite() && price > 0.0) {
                continue;
            }
            if let Some(pos) = self.ledger.positions.get_mut(ticker) {
                pos.last_price = price;
                marked.push(ticker.clone());
            }
        }

        if marked.is_empty() {
            return 0;
        }
        marked.sort();
        self.persist();
        let count = marked.len();
        self.notify(&LedgerEvent::PricesMarked { tickers: marked });
        count
    }

    /// Best-effort save used after every mutation.
    pub(crate) fn persist(&self) {
        if let Err(e) = self.save() {
            error!(error = %e, "failed to persist ledger");
        }
    }

    pub(crate) fn notify(&self, event: &LedgerEvent) {
        for observer in &self.observers {
            observer.on_ledger_event(event);
        }
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "could not read persisted ledger state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unparseable persisted ledger state");
                None
            }
        }
    }

    fn write_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), LedgerError> {
        let raw = serde_json::to_string(value).map_err(|e| LedgerError::Storage {
            reason: format!("failed to serialize {key}: {e}"),
        })?;
        self.store.set(key, &raw)
    }
}

//! Thread-safe handle over a [`LedgerStore`].
//!
//! Every call takes the lock once, so a trade's position update, log append
//! and persist happen as one critical section and records keep call order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::LedgerError;
use super::execution::ExecutionOutcome;
use super::ledger::{Ledger, LedgerStore, Valuation};
use super::performance::PerformanceReport;
use super::trade::TradeIntent;

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<LedgerStore>>,
}

impl SharedLedger {
    pub fn new(store: LedgerStore) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn execute(
        &self,
        ticker: &str,
        name: &str,
        price: f64,
        intent: TradeIntent,
        at: DateTime<Utc>,
    ) -> Result<ExecutionOutcome, LedgerError> {
        self.inner.lock().execute(ticker, name, price, intent, at)
    }

    pub fn mark_prices(&self, prices: &HashMap<String, f64>) -> usize {
        self.inner.lock().mark_prices(prices)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn current_value(&self) -> Valuation {
        self.inner.lock().current_value()
    }

    pub fn analyze(&self) -> PerformanceReport {
        self.inner.lock().analyze()
    }

    /// Copy of the ledger as of this instant.
    pub fn snapshot(&self) -> Ledger {
        self.inner.lock().ledger().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryStore;
    use crate::domain::ledger::DEFAULT_INITIAL_CASH;
    use std::thread;

    #[test]
    fn concurrent_buys_chain_in_order() {
        let shared = SharedLedger::new(LedgerStore::new(
            Box::new(MemoryStore::new()),
            DEFAULT_INITIAL_CASH,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        shared
                            .execute("AAA", "Triple A", 10.0, TradeIntent::Buy { quantity: 1.0 }, Utc::now())
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let ledger = shared.snapshot();
        assert_eq!(ledger.trades.len(), 200);
        assert!((ledger.positions["AAA"].quantity - 200.0).abs() < 1e-9);
        assert!((ledger.cash - (DEFAULT_INITIAL_CASH - 2000.0)).abs() < 1e-6);
        for (i, trade) in ledger.trades.iter().enumerate() {
            assert!((trade.bankroll_after - (DEFAULT_INITIAL_CASH - 10.0 * (i + 1) as f64)).abs() < 1e-6);
        }
    }

    #[test]
    fn sells_chain_cumulative_pl_across_threads() {
        let shared = SharedLedger::new(LedgerStore::new(
            Box::new(MemoryStore::new()),
            DEFAULT_INITIAL_CASH,
        ));
        shared
            .execute("AAA", "Triple A", 10.0, TradeIntent::Buy { quantity: 100.0 }, Utc::now())
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        shared
                            .execute("AAA", "Triple A", 11.0, TradeIntent::Sell { quantity: 1.0 }, Utc::now())
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let ledger = shared.snapshot();
        let mut running = 0.0;
        for trade in &ledger.trades {
            running += trade.trade_pl;
            assert!((trade.cumulative_pl - running).abs() < 1e-9);
        }
        assert!((shared.analyze().realized_pl - 40.0).abs() < 1e-9);
    }
}

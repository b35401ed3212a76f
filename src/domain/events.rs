//! Ledger change notifications.

use super::trade::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    /// A trade was applied and appended to the log.
    TradeExecuted { record: TradeRecord },
    /// Mark prices were refreshed for these tickers.
    PricesMarked { tickers: Vec<String> },
    /// The ledger was reset to its initial state.
    Cleared,
}

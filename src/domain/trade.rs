//! Trade intents and the immutable trade log entries they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller wants done to a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeIntent {
    Buy { quantity: f64 },
    Sell { quantity: f64 },
    /// Sell the entire current holding.
    Liquidate,
}

/// Action stamped on a trade record. `Liquidate` is a sell of the full
/// holding and counts as a sell everywhere realized P/L is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Liquidate,
}

impl TradeAction {
    pub fn is_buy(self) -> bool {
        matches!(self, TradeAction::Buy)
    }

    pub fn is_sell(self) -> bool {
        matches!(self, TradeAction::Sell | TradeAction::Liquidate)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Liquidate => write!(f, "liquidate"),
        }
    }
}

/// One completed trade. Records are appended in execution order and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ticker: String,
    pub name: String,
    pub action: TradeAction,
    pub quantity: f64,
    pub price: f64,
    pub total: f64,
    pub date: DateTime<Utc>,
    pub bankroll_after: f64,
    /// Realized P/L of this trade; 0 for buys.
    pub trade_pl: f64,
    /// Running realized P/L up to and including this trade.
    pub cumulative_pl: f64,
    #[serde(default)]
    pub note: String,
    pub portfolio_value_after: f64,
    pub unrealized_pl_after: f64,
}

impl TradeRecord {
    /// Cash plus marked holdings immediately after this trade.
    pub fn equity_after(&self) -> f64 {
        self.bankroll_after + self.portfolio_value_after
    }
}

//! Position tracking and cost-basis bookkeeping.

use serde::{Deserialize, Serialize};

/// A ticker's holding: fractional share count, weighted average cost basis
/// and the most recent mark price.
///
/// `quantity` is never negative and `avg_buy_price` is 0 whenever
/// `quantity` is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub name: String,
    pub quantity: f64,
    pub avg_buy_price: f64,
    pub last_price: f64,
}

impl Position {
    /// A flat position marked at `price`.
    pub fn new(ticker: &str, name: &str, price: f64) -> Self {
        Position {
            ticker: ticker.to_string(),
            name: name.to_string(),
            quantity: 0.0,
            avg_buy_price: 0.0,
            last_price: price,
        }
    }

    pub fn is_open(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn market_value(&self) -> f64 {
        self.quantity * self.last_price
    }

    pub fn unrealized_pl(&self) -> f64 {
        self.quantity * (self.last_price - self.avg_buy_price)
    }

    /// Add `quantity` shares bought at `price`, re-weighting the cost basis.
    pub fn apply_buy(&mut self, price: f64, quantity: f64) {
        let total = self.quantity + quantity;
        self.avg_buy_price = (self.avg_buy_price * self.quantity + price * quantity) / total;
        self.quantity = total;
    }

    /// Remove up to `quantity` shares. Over-selling clamps at zero; the cost
    /// basis is untouched unless the position goes flat.
    pub fn apply_sell(&mut self, quantity: f64) {
        self.quantity = (self.quantity - quantity).max(0.0);
        if self.quantity == 0.0 {
            self.avg_buy_price = 0.0;
        }
    }
}

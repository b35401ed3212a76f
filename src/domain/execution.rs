//! Trade execution: the only path by which positions, cash and the trade
//! log change.
//!
//! [`apply_intent`] is the pure state transition over a [`Ledger`];
//! [`LedgerStore::execute`] wraps it with persistence and notification.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::error::LedgerError;
use super::events::LedgerEvent;
use super::ledger::{Ledger, LedgerStore};
use super::position::Position;
use super::trade::{TradeAction, TradeIntent, TradeRecord};

/// Result of an execution attempt that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Executed(TradeRecord),
    /// Liquidate found nothing to sell; the ledger is unchanged.
    NoPosition,
}

impl ExecutionOutcome {
    pub fn record(&self) -> Option<&TradeRecord> {
        match self {
            ExecutionOutcome::Executed(record) => Some(record),
            ExecutionOutcome::NoPosition => None,
        }
    }
}

/// Convert a dollar amount into a (fractional) share count at `price`.
pub fn shares_for_amount(amount: f64, price: f64) -> Result<f64, LedgerError> {
    if !(amount.is_finite() && amount > 0.0) {
        return Err(LedgerError::InvalidAmount { amount });
    }
    validate_price(price)?;
    let shares = amount / price;
    validate_quantity(shares)?;
    Ok(shares)
}

fn validate_price(price: f64) -> Result<(), LedgerError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidPrice { price })
    }
}

fn validate_quantity(quantity: f64) -> Result<(), LedgerError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidQuantity { quantity })
    }
}

/// Reject a trade whose value, or the cash, basis, position value or P/L it
/// would produce, is not finite. Non-finite numbers do not survive a JSON
/// round-trip, so accepting one would make the persisted ledger unreadable.
fn check_finite_outcome(
    ledger: &Ledger,
    ticker: &str,
    price: f64,
    intent: TradeIntent,
) -> Result<(), LedgerError> {
    let (held, basis) = ledger
        .positions
        .get(ticker)
        .map_or((0.0, 0.0), |p| (p.quantity, p.avg_buy_price));

    let (quantity, cash_after, basis_after, held_after, trade_pl) = match intent {
        TradeIntent::Buy { quantity } => {
            let total = price * quantity;
            let held_after = held + quantity;
            (
                quantity,
                ledger.cash - total,
                (basis * held + total) / held_after,
                held_after,
                0.0,
            )
        }
        TradeIntent::Sell { quantity } => (
            quantity,
            ledger.cash + price * quantity,
            basis,
            (held - quantity).max(0.0),
            (price - basis) * quantity,
        ),
        TradeIntent::Liquidate => (held, ledger.cash + price * held, 0.0, 0.0, (price - basis) * held),
    };

    let finite = [
        price * quantity,
        cash_after,
        basis_after,
        held_after * price,
        trade_pl,
        ledger.last_cumulative_pl() + trade_pl,
    ]
    .iter()
    .all(|v| v.is_finite());

    if finite {
        Ok(())
    } else {
        Err(LedgerError::TradeOverflow { price, quantity })
    }
}

/// Apply one intent to `ledger`.
///
/// Validation happens before anything is touched, so an `Err` leaves the
/// ledger exactly as it was. That includes trades whose dollar value
/// overflows.
///
/// - Buy re-weights the cost basis and debits cash. Cash may go negative.
/// - Sell realizes `(price - avg_buy_price) * quantity` against the basis
///   held before the sale, clamps the holding at zero and credits
///   `price * quantity`. Both use the requested quantity, even when it
///   exceeds the holding.
/// - Liquidate marks the position at `price` and sells the full holding
///   there. With nothing held it is a no-op.
///
/// The post-trade valuation is stamped on the appended record.
pub fn apply_intent(
    ledger: &mut Ledger,
    ticker: &str,
    name: &str,
    price: f64,
    intent: TradeIntent,
    at: DateTime<Utc>,
) -> Result<ExecutionOutcome, LedgerError> {
    validate_price(price)?;
    match intent {
        TradeIntent::Buy { quantity } | TradeIntent::Sell { quantity } => {
            validate_quantity(quantity)?
        }
        TradeIntent::Liquidate => {}
    }
    check_finite_outcome(ledger, ticker, price, intent)?;

    let previous_cumulative = ledger.last_cumulative_pl();

    let (action, quantity, trade_pl) = match intent {
        TradeIntent::Buy { quantity } => {
            let pos = ledger
                .positions
                .entry(ticker.to_string())
                .or_insert_with(|| Position::new(ticker, name, price));
            pos.last_price = price;
            pos.apply_buy(price, quantity);
            ledger.cash -= price * quantity;
            (TradeAction::Buy, quantity, 0.0)
        }
        TradeIntent::Sell { quantity } => {
            let pos = ledger
                .positions
                .entry(ticker.to_string())
                .or_insert_with(|| Position::new(ticker, name, price));
            pos.last_price = price;
            let trade_pl = (price - pos.avg_buy_price) * quantity;
            pos.apply_sell(quantity);
            ledger.cash += price * quantity;
            (TradeAction::Sell, quantity, trade_pl)
        }
        TradeIntent::Liquidate => {
            let Some(pos) = ledger.positions.get_mut(ticker).filter(|p| p.is_open()) else {
                return Ok(ExecutionOutcome::NoPosition);
            };
            pos.last_price = price;
            let quantity = pos.quantity;
            let trade_pl = (price - pos.avg_buy_price) * quantity;
            pos.quantity = 0.0;
            pos.avg_buy_price = 0.0;
            ledger.cash += price * quantity;
            (TradeAction::Liquidate, quantity, trade_pl)
        }
    };

    let valuation = ledger.current_value();
    let record = TradeRecord {
        ticker: ticker.to_string(),
        name: name.to_string(),
        action,
        quantity,
        price,
        total: quantity * price,
        date: at,
        bankroll_after: ledger.cash,
        trade_pl,
        cumulative_pl: previous_cumulative + trade_pl,
        note: String::new(),
        portfolio_value_after: valuation.market_value,
        unrealized_pl_after: valuation.unrealized_pl,
    };
    ledger.trades.push(record.clone());

    Ok(ExecutionOutcome::Executed(record))
}

impl LedgerStore {
    /// Execute a trade intent, persist the result and notify observers.
    ///
    /// Invalid input is returned as an error with no state change. A
    /// liquidate against an empty position returns
    /// [`ExecutionOutcome::NoPosition`] without persisting or notifying.
    pub fn execute(
        &mut self,
        ticker: &str,
        name: &str,
        price: f64,
        intent: TradeIntent,
        at: DateTime<Utc>,
    ) -> Result<ExecutionOutcome, LedgerError> {
        let outcome = apply_intent(&mut self.ledger, ticker, name, price, intent, at)?;

        match &outcome {
            ExecutionOutcome::Executed(record) => {
                info!(
                    ticker,
                    action = %record.action,
                    quantity = record.quantity,
                    price = record.price,
                    trade_pl = record.trade_pl,
                    cash = record.bankroll_after,
                    "trade executed"
                );
                self.persist();
                self.notify(&LedgerEvent::TradeExecuted {
                    record: record.clone(),
                });
            }
            ExecutionOutcome::NoPosition => {
                debug!(ticker, "liquidate skipped: no shares held");
            }
        }

        Ok(outcome)
    }
}

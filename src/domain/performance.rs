//! Performance statistics derived from the trade log.
//!
//! Everything here is a pure function of the log, the current positions
//! and cash. Statistics that have no data behind them are `None`, which is
//! distinct from a computed zero.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use super::position::Position;
use super::trade::TradeRecord;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const NANOS_PER_DAY: f64 = 86_400_000_000_000.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub realized_pl: f64,
    pub unrealized_pl: f64,
    pub total_pl: f64,
    /// Gross capital deployed by buys; sells are not netted.
    pub invested: f64,
    /// Number of sell-type records.
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of sells with positive P/L; 0 when there are no sells.
    pub win_rate: f64,
    /// Mean realized P/L per sell; 0 when there are no sells.
    pub avg_pl: f64,
    pub largest_win: Option<f64>,
    pub largest_loss: Option<f64>,
    pub sharpe_like: Option<f64>,
    pub max_drawdown: f64,
    /// Percentage.
    pub annualized_return: Option<f64>,
    /// Days.
    pub avg_holding_period: Option<f64>,
}

/// Derive the performance report. `cash` is the current balance and
/// `initial_cash` the starting bankroll that drawdown and return are
/// measured against.
pub fn analyze(
    trades: &[TradeRecord],
    positions: &HashMap<String, Position>,
    cash: f64,
    initial_cash: f64,
) -> PerformanceReport {
    let mut invested = 0.0_f64;
    let mut sell_pls: Vec<f64> = Vec::new();
    let mut wins = 0usize;
    let mut losses = 0usize;

    for trade in trades {
        if trade.action.is_buy() {
            invested += trade.total;
        } else {
            let pl = trade.trade_pl;
            sell_pls.push(pl);
            if pl > 0.0 {
                wins += 1;
            } else if pl < 0.0 {
                losses += 1;
            }
        }
    }

    let realized_pl: f64 = sell_pls.iter().sum();
    let unrealized_pl: f64 = positions
        .values()
        .filter(|p| p.is_open())
        .map(|p| p.unrealized_pl())
        .sum();

    let trade_count = sell_pls.len();
    let (win_rate, avg_pl) = if trade_count > 0 {
        (
            wins as f64 / trade_count as f64 * 100.0,
            realized_pl / trade_count as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let largest_win = sell_pls.iter().copied().reduce(f64::max);
    let largest_loss = sell_pls.iter().copied().reduce(f64::min);

    let sharpe_like = if trade_count >= 2 {
        let sd = sample_std_dev(&sell_pls);
        let denominator = if sd == 0.0 { 1.0 } else { sd };
        Some(avg_pl / denominator)
    } else {
        None
    };

    PerformanceReport {
        realized_pl,
        unrealized_pl,
        total_pl: realized_pl + unrealized_pl,
        invested,
        trade_count,
        wins,
        losses,
        win_rate,
        avg_pl,
        largest_win,
        largest_loss,
        sharpe_like,
        max_drawdown: max_drawdown(trades, initial_cash),
        annualized_return: annualized_return(trades, cash, unrealized_pl, invested, initial_cash),
        avg_holding_period: avg_holding_period(trades),
    }
}

/// Standard deviation with Bessel's correction; 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Largest peak-to-trough fall in equity sampled after each trade. The peak
/// starts at `initial_cash`.
pub fn max_drawdown(trades: &[TradeRecord], initial_cash: f64) -> f64 {
    drawdown_over(trades.iter().map(TradeRecord::equity_after), initial_cash)
}

fn drawdown_over(equity: impl Iterator<Item = f64>, start: f64) -> f64 {
    let mut peak = start;
    let mut max_dd = 0.0_f64;
    for value in equity {
        if value > peak {
            peak = value;
        }
        let dd = peak - value;
        if dd > max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

fn annualized_return(
    trades: &[TradeRecord],
    cash: f64,
    unrealized_pl: f64,
    invested: f64,
    initial_cash: f64,
) -> Option<f64> {
    let (first, last) = match (trades.first(), trades.last()) {
        (Some(first), Some(last)) if trades.len() >= 2 && first.date < last.date => {
            (first.date, last.date)
        }
        _ => return None,
    };
    if initial_cash == 0.0 {
        return None;
    }

    let years = days_between(first, last) / DAYS_PER_YEAR;
    if years <= 0.0 {
        return None;
    }
    // Gross invested capital is added on top of cash, not netted.
    let total_return = (cash + unrealized_pl + invested - initial_cash) / initial_cash;
    let annualized = ((1.0 + total_return).powf(1.0 / years) - 1.0) * 100.0;
    annualized.is_finite().then_some(annualized)
}

/// Mean days between each sell and the earliest unmatched buy of the same
/// ticker. Sells with no buy left to match are not counted.
fn avg_holding_period(trades: &[TradeRecord]) -> Option<f64> {
    let mut open_buys: HashMap<&str, VecDeque<DateTime<Utc>>> = HashMap::new();
    let mut periods: Vec<f64> = Vec::new();

    for trade in trades {
        if trade.action.is_buy() {
            open_buys
                .entry(trade.ticker.as_str())
                .or_default()
                .push_back(trade.date);
        } else if let Some(bought) = open_buys
            .get_mut(trade.ticker.as_str())
            .and_then(|queue| queue.pop_front())
        {
            periods.push(days_between(bought, trade.date));
        }
    }

    if periods.is_empty() {
        None
    } else {
        Some(periods.iter().sum::<f64>() / periods.len() as f64)
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let span = to - from;
    match span.num_nanoseconds() {
        Some(nanos) => nanos as f64 / NANOS_PER_DAY,
        // Spans beyond ~292 years overflow i64 nanoseconds.
        None => span.num_milliseconds() as f64 / MILLIS_PER_DAY,
    }
}

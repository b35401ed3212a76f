//! Price history retrieval on top of a [`QuoteFeed`].
//!
//! Feeds answer batch requests with whatever subset of symbols they have;
//! [`fetch_all`] re-requests the missing ones in smaller chunks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::error::LedgerError;
use crate::ports::quote_port::QuoteFeed;

pub const DEFAULT_CHUNK_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Lookback window in calendar days for a number of weeks.
pub fn lookback_days(weeks: u32) -> u32 {
    weeks.saturating_mul(7)
}

/// Upper-cased, trimmed tickers with blanks and repeats removed, order kept.
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Fetch histories for `tickers`, retrying symbols the feed left out in
/// chunks of `chunk_size`. An error on the initial batch is returned; errors
/// on retry chunks are logged and those symbols stay missing.
pub fn fetch_all(
    feed: &dyn QuoteFeed,
    tickers: &[String],
    lookback_days: u32,
    chunk_size: usize,
) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError> {
    let wanted = normalize_tickers(tickers);
    let mut histories = HashMap::new();
    if wanted.is_empty() {
        return Ok(histories);
    }

    let batch = feed.fetch_history(&wanted, lookback_days)?;
    let missing = absorb(&mut histories, batch, &wanted);
    retry_missing(feed, missing, lookback_days, chunk_size.max(1), &mut histories);
    Ok(histories)
}

fn retry_missing(
    feed: &dyn QuoteFeed,
    missing: Vec<String>,
    lookback_days: u32,
    chunk_size: usize,
    histories: &mut HashMap<String, Vec<PricePoint>>,
) {
    if missing.is_empty() {
        return;
    }
    warn!(missing = ?missing, "feed omitted symbols, refetching in chunks");

    for chunk in missing.chunks(chunk_size) {
        debug!(chunk = ?chunk, "refetching chunk");
        let batch = match feed.fetch_history(chunk, lookback_days) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(chunk = ?chunk, error = %e, "chunk refetch failed");
                continue;
            }
        };
        let before = histories.len();
        let still_missing = absorb(histories, batch, chunk);
        // Only recurse while rounds keep making progress.
        if histories.len() > before && still_missing.len() < chunk.len() {
            retry_missing(feed, still_missing, lookback_days, chunk_size, histories);
        } else if !still_missing.is_empty() {
            warn!(symbols = ?still_missing, "no data returned");
        }
    }
}

/// Keep non-empty histories for requested symbols; return requested symbols
/// still without data.
fn absorb(
    histories: &mut HashMap<String, Vec<PricePoint>>,
    batch: HashMap<String, Vec<PricePoint>>,
    requested: &[String],
) -> Vec<String> {
    for (symbol, points) in batch {
        if !points.is_empty() && requested.contains(&symbol) {
            histories.insert(symbol, points);
        }
    }
    requested
        .iter()
        .filter(|t| !histories.contains_key(*t))
        .cloned()
        .collect()
}

/// Last close of each non-empty history, for marking positions.
pub fn latest_closes(histories: &HashMap<String, Vec<PricePoint>>) -> HashMap<String, f64> {
    histories
        .iter()
        .filter_map(|(symbol, points)| points.last().map(|p| (symbol.clone(), p.close)))
        .collect()
}

/// Day-over-day close changes, aligned with `points[1..]`.
pub fn daily_changes(points: &[PricePoint]) -> Vec<f64> {
    points.windows(2).map(|w| w[1].close - w[0].close).collect()
}

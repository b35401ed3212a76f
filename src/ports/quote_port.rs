//! Quote feed port.

use crate::domain::error::LedgerError;
use crate::domain::quotes::PricePoint;
use std::collections::HashMap;

pub trait QuoteFeed {
    /// Daily closes for up to `lookback_days` per ticker, oldest first.
    ///
    /// The result may cover only a subset of `tickers`; retrying the
    /// missing ones is the caller's business.
    fn fetch_history(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError>;
}

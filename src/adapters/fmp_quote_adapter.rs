//! Financial Modeling Prep historical price adapter.
//!
//! Response parsing is always available; the HTTP transport needs the `fmp`
//! feature.

use crate::domain::error::LedgerError;
use crate::domain::quotes::PricePoint;
use crate::domain::settings::QuoteSettings;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct FmpBar {
    date: NaiveDate,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct FmpSeries {
    symbol: String,
    #[serde(default)]
    historical: Vec<FmpBar>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    Single {
        symbol: String,
        historical: Vec<FmpBar>,
    },
    Batch {
        #[serde(rename = "historicalStockList")]
        historical_stock_list: Vec<FmpSeries>,
    },
    Failure {
        #[serde(rename = "Error Message")]
        message: String,
    },
    Empty {},
}

/// Parse a `historical-price-full` body into oldest-first histories.
/// Symbols with no bars are left out.
pub fn parse_history_response(body: &str) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError> {
    let response: HistoryResponse =
        serde_json::from_str(body).map_err(|e| LedgerError::QuoteFeed {
            reason: format!("unexpected response format: {e}"),
        })?;

    let series = match response {
        HistoryResponse::Single { symbol, historical } => vec![FmpSeries { symbol, historical }],
        HistoryResponse::Batch {
            historical_stock_list,
        } => historical_stock_list,
        HistoryResponse::Failure { message } => {
            return Err(LedgerError::QuoteFeed { reason: message });
        }
        HistoryResponse::Empty {} => Vec::new(),
    };

    Ok(series
        .into_iter()
        .filter(|s| !s.historical.is_empty())
        .map(|s| {
            let mut points: Vec<PricePoint> = s
                .historical
                .into_iter()
                .map(|bar| PricePoint {
                    date: bar.date,
                    close: bar.close,
                })
                .collect();
            points.sort_by_key(|p| p.date);
            (s.symbol, points)
        })
        .collect())
}

pub struct FmpQuoteAdapter {
    api_key: String,
    base_url: String,
    #[cfg(feature = "fmp")]
    client: reqwest::blocking::Client,
}

impl FmpQuoteAdapter {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        FmpQuoteAdapter {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            #[cfg(feature = "fmp")]
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn from_settings(settings: &QuoteSettings) -> Result<Self, LedgerError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| LedgerError::ConfigMissing {
                section: "quotes".into(),
                key: "api_key".into(),
            })?;
        Ok(Self::new(api_key, &settings.base_url))
    }

    pub fn history_url(&self, tickers: &[String], lookback_days: u32) -> String {
        format!(
            "{}/historical-price-full/{}?apikey={}&timeseries={}",
            self.base_url,
            tickers.join(","),
            self.api_key,
            lookback_days
        )
    }
}

#[cfg(feature = "fmp")]
impl crate::ports::quote_port::QuoteFeed for FmpQuoteAdapter {
    fn fetch_history(
        &self,
        tickers: &[String],
        lookback_days: u32,
    ) -> Result<HashMap<String, Vec<PricePoint>>, LedgerError> {
        tracing::debug!(tickers = ?tickers, lookback_days, "requesting price history");
        let body = self
            .client
            .get(self.history_url(tickers, lookback_days))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| LedgerError::QuoteFeed {
                reason: e.without_url().to_string(),
            })?;
        parse_history_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_symbol_newest_first() {
        let body = r#"{
            "symbol": "AAPL",
            "historical": [
                {"date": "2024-05-03", "open": 186.6, "close": 183.38, "volume": 163224100},
                {"date": "2024-05-02", "open": 172.5, "close": 173.03, "volume": 94214900}
            ]
        }"#;
        let result = parse_history_response(body).unwrap();
        let points = &result["AAPL"];
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(points[1].close, 183.38);
    }

    #[test]
    fn parses_batch_and_drops_empty_series() {
        let body = r#"{
            "historicalStockList": [
                {"symbol": "MSFT", "historical": [{"date": "2024-05-03", "close": 406.66}]},
                {"symbol": "XOM", "historical": []},
                {"symbol": "KO"}
            ]
        }"#;
        let result = parse_history_response(body).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["MSFT"][0].close, 406.66);
    }

    #[test]
    fn empty_object_means_no_data() {
        assert!(parse_history_response("{}").unwrap().is_empty());
    }

    #[test]
    fn error_message_is_surfaced() {
        let body = r#"{"Error Message": "Invalid API KEY."}"#;
        let err = parse_history_response(body).unwrap_err();
        assert_eq!(err.to_string(), "quote feed error: Invalid API KEY.");
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(
            parse_history_response("[1, 2, 3]"),
            Err(LedgerError::QuoteFeed { .. })
        ));
    }

    #[test]
    fn history_url_joins_tickers() {
        let adapter = FmpQuoteAdapter::new("k3y", "https://example.test/api/v3/");
        let url = adapter.history_url(&["AAPL".to_string(), "MSFT".to_string()], 14);
        assert_eq!(
            url,
            "https://example.test/api/v3/historical-price-full/AAPL,MSFT?apikey=k3y&timeseries=14"
        );
    }

    #[test]
    fn from_settings_requires_api_key() {
        let settings = QuoteSettings::default();
        assert!(matches!(
            FmpQuoteAdapter::from_settings(&settings),
            Err(LedgerError::ConfigMissing { .. })
        ));
    }
}

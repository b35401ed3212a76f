//! Domain error types.

/// Top-level error type for paperledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid price {price}: must be a positive, finite number")]
    InvalidPrice { price: f64 },

    #[error("invalid quantity {quantity}: must be a positive, finite number of shares")]
    InvalidQuantity { quantity: f64 },

    #[error("invalid dollar amount {amount}: must be a positive, finite number")]
    InvalidAmount { amount: f64 },

    #[error("trade of {quantity} shares at {price} does not have a finite value")]
    TradeOverflow { price: f64, quantity: f64 },

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("catalog error: {reason}")]
    Catalog { reason: String },

    #[error("quote feed error: {reason}")]
    QuoteFeed { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// True for rejected trade intents (bad price, quantity or amount).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidPrice { .. }
                | LedgerError::InvalidQuantity { .. }
                | LedgerError::InvalidAmount { .. }
                | LedgerError::TradeOverflow { .. }
        )
    }
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) => 1,
            LedgerError::ConfigParse { .. }
            | LedgerError::ConfigMissing { .. }
            | LedgerError::ConfigInvalid { .. } => 2,
            LedgerError::Storage { .. } => 3,
            LedgerError::InvalidPrice { .. }
            | LedgerError::InvalidQuantity { .. }
            | LedgerError::InvalidAmount { .. }
            | LedgerError::TradeOverflow { .. } => 4,
            LedgerError::Catalog { .. } | LedgerError::QuoteFeed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

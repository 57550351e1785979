use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body returned for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorShape {
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No OHLCV data found for {symbol}.")]
    NoMarketData { symbol: String },

    #[error("Market data not available for '{symbol}'.")]
    MarketDataUnavailable { symbol: String },

    #[error("Analysis for {symbol} is not yet available. It has been scheduled. Please check back in a few minutes.")]
    AnalysisPending { symbol: String },

    #[error("{message}")]
    AnalysisFailed { message: String },

    #[error("Watchlist item {id} not found.")]
    WatchlistItemNotFound { id: i64 },

    #[error("{reason}")]
    InvalidRequest { reason: String },

    #[error("Provider {provider} error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Email error: {reason}")]
    EmailError { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl EngineError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            detail: self.to_string(),
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::NoMarketData { .. } => 404,
            EngineError::MarketDataUnavailable { .. } => 404,
            EngineError::AnalysisPending { .. } => 202,
            EngineError::AnalysisFailed { .. } => 500,
            EngineError::WatchlistItemNotFound { .. } => 404,
            EngineError::InvalidRequest { .. } => 400,
            EngineError::ProviderError { .. } => 502,
            EngineError::EmailError { .. } => 500,
            EngineError::DatabaseError { .. } => 500,
            EngineError::SqlxError(_) => 500,
            EngineError::SerdeError(_) => 500,
            EngineError::ConfigError { .. } => 500,
            EngineError::InternalError { .. } => 500,
        }
    }
}

impl From<figment::Error> for EngineError {
    fn from(err: figment::Error) -> Self {
        EngineError::ConfigError {
            reason: err.to_string(),
        }
    }
}

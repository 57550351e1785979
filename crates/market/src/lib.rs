//! Outbound data: OHLCV candles, news headlines and headline classification.

pub mod feed;
pub mod finnhub;
pub mod newsdata;
pub mod openrouter;
pub mod sentiment;
pub mod source;
pub mod symbols;
pub mod twelvedata;

pub use feed::CandleFeed;
pub use finnhub::FinnhubClient;
pub use newsdata::NewsdataClient;
pub use openrouter::{KeywordClassifier, OpenRouterClassifier};
pub use sentiment::SentimentAnalyzer;
pub use source::{CandleSource, HeadlineClassifier, HeadlineSource, UsageLog};
pub use symbols::{canonical_symbol, provider_symbol};
pub use twelvedata::TwelveDataClient;

use jetbuddy_models::EngineError;
use std::time::Duration;

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, EngineError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EngineError::InternalError {
            reason: format!("Failed to build HTTP client: {}", e),
        })
}

pub(crate) fn provider_error(provider: &str, message: impl ToString) -> EngineError {
    EngineError::ProviderError {
        provider: provider.to_string(),
        message: message.to_string(),
    }
}

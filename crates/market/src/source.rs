use async_trait::async_trait;
use jetbuddy_models::{Bias, Candle, EngineError};

/// Supplier of OHLCV history, oldest candle first.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Name recorded in the API usage log.
    fn name(&self) -> &'static str;

    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, EngineError>;
}

#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Recent headlines; failures surface as an empty list.
    async fn headlines(&self, symbol: &str) -> Vec<String>;
}

#[async_trait]
pub trait HeadlineClassifier: Send + Sync {
    async fn classify(&self, headline: &str, symbol: &str) -> Bias;
}

/// Per-provider call accounting backing the rate limit.
#[async_trait]
pub trait UsageLog: Send + Sync {
    async fn record_call(&self, provider: &str) -> Result<(), EngineError>;

    async fn calls_in_last_minute(&self, provider: &str) -> Result<i64, EngineError>;
}

use crate::source::{CandleSource, UsageLog};
use crate::symbols::provider_symbol;
use jetbuddy_models::MarketData;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Primary candle provider guarded by a per-minute call budget, with a fallback.
#[derive(Clone)]
pub struct CandleFeed {
    primary: Arc<dyn CandleSource>,
    fallback: Arc<dyn CandleSource>,
    usage: Arc<dyn UsageLog>,
    primary_rate_limit: u32,
}

impl CandleFeed {
    pub fn new(
        primary: Arc<dyn CandleSource>,
        fallback: Arc<dyn CandleSource>,
        usage: Arc<dyn UsageLog>,
        primary_rate_limit: u32,
    ) -> Self {
        Self {
            primary,
            fallback,
            usage,
            primary_rate_limit,
        }
    }

    async fn record(&self, provider: &str) {
        if let Err(e) = self.usage.record_call(provider).await {
            warn!(provider, error = %e, "Failed to record API call");
        }
    }

    async fn primary_has_budget(&self) -> bool {
        match self.usage.calls_in_last_minute(self.primary.name()).await {
            Ok(calls) => calls < i64::from(self.primary_rate_limit),
            Err(e) => {
                warn!(error = %e, "Could not read API usage, assuming budget is available");
                true
            }
        }
    }

    /// Candles for `symbol` plus a note naming the provider used. `None` when every
    /// provider failed or returned nothing.
    #[instrument(skip(self))]
    pub async fn fetch(&self, symbol: &str) -> Option<MarketData> {
        let ticker = provider_symbol(symbol);

        let reason = if self.primary_has_budget().await {
            self.record(self.primary.name()).await;
            match self.primary.fetch_candles(&ticker).await {
                Ok(candles) if !candles.is_empty() => {
                    return Some(MarketData {
                        candles,
                        source: self.primary.name().to_string(),
                    });
                }
                Ok(_) => "returned no data",
                Err(e) => {
                    warn!(provider = self.primary.name(), error = %e, "Primary candle provider failed");
                    "unavailable"
                }
            }
        } else {
            info!(provider = self.primary.name(), "Rate limit reached, using fallback provider");
            "rate limit reached"
        };

        self.record(self.fallback.name()).await;
        match self.fallback.fetch_candles(&ticker).await {
            Ok(candles) if !candles.is_empty() => Some(MarketData {
                candles,
                source: format!("{} (fallback, {} {})", self.fallback.name(), self.primary.name(), reason),
            }),
            Ok(_) => None,
            Err(e) => {
                warn!(provider = self.fallback.name(), error = %e, "Fallback candle provider failed");
                None
            }
        }
    }
}

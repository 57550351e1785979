use crate::source::CandleSource;
use crate::{http_client, provider_error};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use jetbuddy_models::{Candle, EngineError, ProvidersConfig};
use serde::Deserialize;
use tracing::{debug, instrument};

pub const PROVIDER: &str = "finnhub";

/// Column-oriented candle payload of `/stock/candle`.
#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

impl CandleResponse {
    fn into_candles(self) -> Vec<Candle> {
        let len = [self.c.len(), self.h.len(), self.l.len(), self.o.len(), self.t.len()]
            .into_iter()
            .min()
            .unwrap_or(0);
        (0..len)
            .filter_map(|i| {
                let timestamp = Utc.timestamp_opt(self.t[i], 0).single()?;
                Some(Candle {
                    timestamp,
                    open: self.o[i],
                    high: self.h[i],
                    low: self.l[i],
                    close: self.c[i],
                    volume: self.v.get(i).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct FinnhubClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    resolution_minutes: u32,
    candle_count: usize,
    lookback_days: i64,
}

impl FinnhubClient {
    pub fn new(config: &ProvidersConfig) -> Result<Self, EngineError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.finnhub_base_url.trim_end_matches('/').to_string(),
            api_key: config.finnhub_api_key.clone(),
            resolution_minutes: config.resolution_minutes,
            candle_count: config.candle_count,
            lookback_days: config.lookback_days,
        })
    }
}

#[async_trait]
impl CandleSource for FinnhubClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, EngineError> {
        let token = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error(PROVIDER, "API key not configured"))?;

        let to = Utc::now();
        let from = to - Duration::days(self.lookback_days);

        let response = self
            .client
            .get(format!("{}/stock/candle", self.base_url))
            .query(&[
                ("symbol", symbol.to_string()),
                ("resolution", self.resolution_minutes.to_string()),
                ("from", from.timestamp().to_string()),
                ("to", to.timestamp().to_string()),
                ("token", token.to_string()),
            ])
            .send()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| provider_error(PROVIDER, e))?;

        let body: CandleResponse = response.json().await.map_err(|e| provider_error(PROVIDER, e))?;
        if body.s != "ok" || body.c.is_empty() {
            return Err(provider_error(PROVIDER, format!("No data for {}", symbol)));
        }

        let mut candles = body.into_candles();
        let skip = candles.len().saturating_sub(self.candle_count);
        candles.drain(..skip);
        debug!(count = candles.len(), "Fetched Finnhub candles");
        Ok(candles)
    }
}

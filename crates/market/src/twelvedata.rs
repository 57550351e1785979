use crate::source::CandleSource;
use crate::{http_client, provider_error};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use jetbuddy_models::{Candle, EngineError, ProvidersConfig};
use serde::Deserialize;
use tracing::{debug, instrument};

pub const PROVIDER: &str = "twelvedata";

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Vec<TimeSeriesValue>,
}

/// Prices arrive as strings; forex series carry no volume.
#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl TimeSeriesValue {
    fn to_candle(&self) -> Option<Candle> {
        Some(Candle {
            timestamp: parse_datetime(&self.datetime)?,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self
                .volume
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
        })
    }
}

#[derive(Clone)]
pub struct TwelveDataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    resolution_minutes: u32,
    candle_count: usize,
}

impl TwelveDataClient {
    pub fn new(config: &ProvidersConfig) -> Result<Self, EngineError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.twelvedata_base_url.trim_end_matches('/').to_string(),
            api_key: config.twelvedata_api_key.clone(),
            resolution_minutes: config.resolution_minutes,
            candle_count: config.candle_count,
        })
    }
}

#[async_trait]
impl CandleSource for TwelveDataClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, EngineError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error(PROVIDER, "API key not configured"))?;

        let body: TimeSeriesResponse = self
            .client
            .get(format!("{}/time_series", self.base_url))
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", format!("{}min", self.resolution_minutes)),
                ("outputsize", self.candle_count.to_string()),
                ("apikey", key.to_string()),
            ])
            .send()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| provider_error(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?;

        if body.status.as_deref() == Some("error") {
            let message = body.message.unwrap_or_else(|| "unknown error".to_string());
            return Err(provider_error(PROVIDER, message));
        }

        // newest first on the wire
        let candles: Vec<Candle> = body.values.iter().rev().filter_map(TimeSeriesValue::to_candle).collect();
        if candles.is_empty() {
            return Err(provider_error(PROVIDER, format!("No data for {}", symbol)));
        }
        debug!(count = candles.len(), "Fetched Twelve Data candles");
        Ok(candles)
    }
}

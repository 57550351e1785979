use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use httpmock::prelude::*;
use jetbuddy_market::{
    CandleFeed, CandleSource, FinnhubClient, HeadlineClassifier, HeadlineSource, NewsdataClient,
    OpenRouterClassifier, SentimentAnalyzer, TwelveDataClient, UsageLog,
};
use jetbuddy_models::{Bias, Candle, Config, EngineError, ProvidersConfig};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn providers(server: &MockServer) -> ProvidersConfig {
    let mut config = Config::default().providers;
    config.finnhub_api_key = Some("fh-key".to_string());
    config.twelvedata_api_key = Some("td-key".to_string());
    config.newsdata_api_key = Some("nd-key".to_string());
    config.openrouter_api_key = Some("or-key".to_string());
    config.finnhub_base_url = server.base_url();
    config.twelvedata_base_url = server.base_url();
    config.newsdata_base_url = server.base_url();
    config.openrouter_base_url = server.base_url();
    config.candle_count = 3;
    config.max_headlines = 2;
    config
}

#[tokio::test]
async fn finnhub_keeps_the_latest_candles() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/stock/candle")
                .query_param("symbol", "AAPL")
                .query_param("resolution", "15")
                .query_param("token", "fh-key");
            then.status(200).json_body(json!({
                "s": "ok",
                "t": [1704189600, 1704190500, 1704191400, 1704192300],
                "o": [1.0, 2.0, 3.0, 4.0],
                "h": [1.5, 2.5, 3.5, 4.5],
                "l": [0.5, 1.5, 2.5, 3.5],
                "c": [1.2, 2.2, 3.2, 4.2],
                "v": [10.0, 20.0, 30.0, 40.0]
            }));
        })
        .await;

    let client = FinnhubClient::new(&providers(&server)).unwrap();
    let candles = client.fetch_candles("AAPL").await.unwrap();
    mock.assert_async().await;

    assert_eq!(candles.len(), 3);
    assert_eq!(candles[0].close, 2.2);
    assert_eq!(candles[2].close, 4.2);
    assert_eq!(candles[2].timestamp, Utc.timestamp_opt(1704192300, 0).unwrap());
}

#[tokio::test]
async fn finnhub_no_data_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/candle");
            then.status(200).json_body(json!({ "s": "no_data" }));
        })
        .await;

    let client = FinnhubClient::new(&providers(&server)).unwrap();
    let err = client.fetch_candles("EUR/USD").await.unwrap_err();
    assert!(matches!(err, EngineError::ProviderError { .. }));
}

#[tokio::test]
async fn finnhub_without_key_makes_no_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/stock/candle");
            then.status(200);
        })
        .await;

    let mut config = providers(&server);
    config.finnhub_api_key = None;
    let client = FinnhubClient::new(&config).unwrap();
    assert!(client.fetch_candles("AAPL").await.is_err());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn twelvedata_values_are_reordered_oldest_first() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/time_series")
                .query_param("symbol", "EUR/USD")
                .query_param("interval", "15min")
                .query_param("apikey", "td-key");
            then.status(200).json_body(json!({
                "status": "ok",
                "values": [
                    { "datetime": "2024-01-02 10:30:00", "open": "1.3", "high": "1.4", "low": "1.2", "close": "1.35" },
                    { "datetime": "2024-01-02 10:15:00", "open": "1.2", "high": "1.3", "low": "1.1", "close": "1.25" }
                ]
            }));
        })
        .await;

    let client = TwelveDataClient::new(&providers(&server)).unwrap();
    let candles = client.fetch_candles("EUR/USD").await.unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].close, 1.25);
    assert_eq!(candles[1].close, 1.35);
    assert_eq!(candles[1].volume, 0.0);
    assert!(candles[0].timestamp < candles[1].timestamp);
}

#[tokio::test]
async fn twelvedata_error_status_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/time_series");
            then.status(200)
                .json_body(json!({ "status": "error", "code": 400, "message": "symbol not found" }));
        })
        .await;

    let client = TwelveDataClient::new(&providers(&server)).unwrap();
    let err = client.fetch_candles("NOPE").await.unwrap_err();
    assert!(err.to_string().contains("symbol not found"));
}

#[tokio::test]
async fn newsdata_returns_top_titles() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/news")
                .query_param("q", "AAPL")
                .query_param("language", "en")
                .query_param("category", "business");
            then.status(200).json_body(json!({
                "status": "success",
                "results": [
                    { "title": "Apple beats estimates" },
                    { "title": null },
                    { "title": "Apple shares rise" },
                    { "title": "Third headline" }
                ]
            }));
        })
        .await;

    let client = NewsdataClient::new(&providers(&server)).unwrap();
    let headlines = client.headlines("AAPL").await;
    assert_eq!(headlines, vec!["Apple beats estimates", "Apple shares rise"]);
}

#[tokio::test]
async fn newsdata_failure_yields_no_headlines() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/news");
            then.status(500);
        })
        .await;

    let client = NewsdataClient::new(&providers(&server)).unwrap();
    assert!(client.headlines("AAPL").await.is_empty());
}

#[tokio::test]
async fn openrouter_reply_is_parsed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer or-key");
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "Bearish." } }]
            }));
        })
        .await;

    let classifier = OpenRouterClassifier::new(&providers(&server)).unwrap();
    assert_eq!(classifier.classify("Quarterly update", "AAPL").await, Bias::Bearish);
    mock.assert_async().await;
}

#[tokio::test]
async fn openrouter_failure_falls_back_to_keywords() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429);
        })
        .await;

    let classifier = OpenRouterClassifier::new(&providers(&server)).unwrap();
    assert_eq!(classifier.classify("Apple gains ground", "AAPL").await, Bias::Bullish);
    assert_eq!(classifier.classify("Apple misses", "AAPL").await, Bias::Bearish);
}

struct FixedHeadlines(Vec<&'static str>);

#[async_trait]
impl HeadlineSource for FixedHeadlines {
    async fn headlines(&self, _symbol: &str) -> Vec<String> {
        self.0.iter().map(|s| s.to_string()).collect()
    }
}

#[tokio::test]
async fn sentiment_takes_dominant_label() {
    let headlines = FixedHeadlines(vec!["Stock rises", "Stock falls", "Upgrade issued"]);
    let analyzer = SentimentAnalyzer::new(Arc::new(headlines), Arc::new(jetbuddy_market::KeywordClassifier));
    let summary = analyzer.analyze("AAPL").await;
    assert_eq!(summary.sentiment, Bias::Bullish);
    assert_eq!(summary.confidence, 0.67);
}

#[derive(Default)]
struct MemoryUsage {
    calls: Mutex<Vec<String>>,
    preset: i64,
}

#[async_trait]
impl UsageLog for MemoryUsage {
    async fn record_call(&self, provider: &str) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(provider.to_string());
        Ok(())
    }

    async fn calls_in_last_minute(&self, provider: &str) -> Result<i64, EngineError> {
        let recorded = self.calls.lock().unwrap().iter().filter(|p| *p == provider).count() as i64;
        Ok(self.preset + recorded)
    }
}

struct StaticSource {
    name: &'static str,
    candles: Option<Vec<Candle>>,
    requested: Mutex<Vec<String>>,
}

impl StaticSource {
    fn new(name: &'static str, candles: Option<Vec<Candle>>) -> Arc<Self> {
        Arc::new(Self {
            name,
            candles,
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CandleSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, EngineError> {
        self.requested.lock().unwrap().push(symbol.to_string());
        self.candles.clone().ok_or_else(|| EngineError::ProviderError {
            provider: self.name.to_string(),
            message: "down".to_string(),
        })
    }
}

fn one_candle() -> Vec<Candle> {
    vec![Candle {
        timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        open: 1.0,
        high: 1.2,
        low: 0.9,
        close: 1.1,
        volume: 5.0,
    }]
}

#[tokio::test]
async fn feed_prefers_primary_and_uses_provider_ticker() {
    let primary = StaticSource::new("finnhub", Some(one_candle()));
    let fallback = StaticSource::new("twelvedata", Some(one_candle()));
    let usage = Arc::new(MemoryUsage::default());
    let feed = CandleFeed::new(primary.clone(), fallback.clone(), usage.clone(), 25);

    let data = feed.fetch("EURUSD").await.unwrap();
    assert_eq!(data.source, "finnhub");
    assert_eq!(primary.requested.lock().unwrap().as_slice(), ["EUR/USD"]);
    assert!(fallback.requested.lock().unwrap().is_empty());
    assert_eq!(usage.calls.lock().unwrap().as_slice(), ["finnhub"]);
}

#[tokio::test]
async fn feed_falls_back_when_rate_limited() {
    let primary = StaticSource::new("finnhub", Some(one_candle()));
    let fallback = StaticSource::new("twelvedata", Some(one_candle()));
    let usage = Arc::new(MemoryUsage {
        preset: 25,
        ..Default::default()
    });
    let feed = CandleFeed::new(primary.clone(), fallback, usage.clone(), 25);

    let data = feed.fetch("AAPL").await.unwrap();
    assert_eq!(data.source, "twelvedata (fallback, finnhub rate limit reached)");
    assert!(primary.requested.lock().unwrap().is_empty());
    assert_eq!(usage.calls.lock().unwrap().as_slice(), ["twelvedata"]);
}

#[tokio::test]
async fn feed_falls_back_when_primary_fails() {
    let primary = StaticSource::new("finnhub", None);
    let fallback = StaticSource::new("twelvedata", Some(one_candle()));
    let feed = CandleFeed::new(primary, fallback, Arc::new(MemoryUsage::default()), 25);

    let data = feed.fetch("AAPL").await.unwrap();
    assert_eq!(data.source, "twelvedata (fallback, finnhub unavailable)");
    assert_eq!(data.candles.len(), 1);
}

#[tokio::test]
async fn feed_returns_none_when_everything_fails() {
    let primary = StaticSource::new("finnhub", None);
    let fallback = StaticSource::new("twelvedata", Some(Vec::new()));
    let feed = CandleFeed::new(primary, fallback, Arc::new(MemoryUsage::default()), 25);
    assert!(feed.fetch("AAPL").await.is_none());
}

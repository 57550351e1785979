use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use jetbuddy_api::{build_router, AppState};
use jetbuddy_control::{AnalysisPipeline, Notifier, Store, StoreUsageLog};
use jetbuddy_market::{CandleFeed, CandleSource, HeadlineSource, KeywordClassifier, SentimentAnalyzer};
use jetbuddy_metrics::MetricsService;
use jetbuddy_models::{AnalysisOutput, Candle, Config, EngineError};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

struct Candles(Option<Vec<Candle>>);

#[async_trait]
impl CandleSource for Candles {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_candles(&self, _symbol: &str) -> Result<Vec<Candle>, EngineError> {
        self.0.clone().ok_or_else(|| EngineError::ProviderError {
            provider: "finnhub".to_string(),
            message: "offline".to_string(),
        })
    }
}

struct NoCandles;

#[async_trait]
impl CandleSource for NoCandles {
    fn name(&self) -> &'static str {
        "twelvedata"
    }

    async fn fetch_candles(&self, _symbol: &str) -> Result<Vec<Candle>, EngineError> {
        Ok(Vec::new())
    }
}

struct Headlines;

#[async_trait]
impl HeadlineSource for Headlines {
    async fn headlines(&self, _symbol: &str) -> Vec<String> {
        vec!["Shares fall on weak guidance".to_string()]
    }
}

struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn send_report(&self, _output: &AnalysisOutput, _recipients: &[String]) -> Result<bool, EngineError> {
        Ok(false)
    }
}

fn sample_candles(n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i % 7) as f64 * 0.4 - i as f64 * 0.05;
            Candle {
                timestamp: start + Duration::minutes(15 * i as i64),
                open: close + 0.1,
                high: close + 0.3,
                low: close - 0.3,
                close,
                volume: 10.0,
            }
        })
        .collect()
}

async fn app_with(candles: Option<Vec<Candle>>, config: Config) -> (Router, AppState) {
    let _ = tracing_subscriber::fmt::try_init();

    let store = Store::connect("sqlite::memory:").await.unwrap();
    let metrics = Arc::new(MetricsService::new().unwrap());
    let feed = CandleFeed::new(
        Arc::new(Candles(candles)),
        Arc::new(NoCandles),
        Arc::new(StoreUsageLog::new(store.clone(), metrics.clone())),
        config.providers.finnhub_rate_limit,
    );
    let sentiment = SentimentAnalyzer::new(Arc::new(Headlines), Arc::new(KeywordClassifier));
    let pipeline = AnalysisPipeline::new(
        feed,
        sentiment,
        store,
        Arc::new(SilentNotifier),
        metrics.clone(),
        config.analysis.clone(),
        config.providers.resolution_minutes,
    );

    let state = AppState::new(config, Arc::new(pipeline), metrics);
    (build_router(state.clone()), state)
}

async fn app() -> (Router, AppState) {
    app_with(Some(sample_candles(60)), Config::default()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_reports_running() {
    let (app, _) = app().await;
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Jet Buddy is running!" }));
}

#[tokio::test]
async fn uncached_analysis_is_scheduled_then_served() {
    let (app, state) = app().await;

    let (status, body) = send(&app, get("/analyze/aapl")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(
        body["detail"],
        "Analysis for AAPL is not yet available. It has been scheduled. Please check back in a few minutes."
    );

    let mut cached = None;
    for _ in 0..100 {
        cached = state.store.get_cached_analysis("AAPL").await.unwrap();
        if cached.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(cached.is_some(), "background run should populate the cache");

    let (status, body) = send(&app, get("/analyze/AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sentiment"], "bearish");
}

#[tokio::test]
async fn cached_error_is_a_server_error() {
    let (app, state) = app().await;
    state
        .store
        .set_cached_analysis(&AnalysisOutput::failed("TSLA", "provider exploded"))
        .await
        .unwrap();

    let (status, body) = send(&app, get("/analyze/TSLA")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "provider exploded" }));
}

#[tokio::test]
async fn force_run_returns_the_fresh_output() {
    let (app, state) = app().await;
    let request = Request::post("/analyze/force-run/btc").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BTCUSD");
    assert!(state.store.get_cached_analysis("BTCUSD").await.unwrap().is_some());
}

#[tokio::test]
async fn force_run_without_data_is_not_found() {
    let (app, _) = app_with(None, Config::default()).await;
    let request = Request::post("/analyze/force-run/XYZ").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No OHLCV data found for XYZ.");
}

#[tokio::test]
async fn watchlist_add_list_and_remove() {
    let (app, _) = app().await;

    let (status, body) = send(
        &app,
        post_json("/watchlist/add", json!({ "symbol": "eur/usd", "email": "fx@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["message"],
        "'eur/usd' (as 'EURUSD') added to watchlist. Analysis triggered. Signal will be sent to fx@example.com."
    );

    let (status, body) = send(&app, post_json("/watchlist/add", json!({ "symbol": "apple" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "'apple' (as 'AAPL') added to watchlist. Analysis triggered.");

    let (status, body) = send(&app, get("/watchlist")).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["normalized_symbol"], "EURUSD");
    assert_eq!(items[1]["email"], Value::Null);
    let id = items[0]["id"].as_i64().unwrap();

    let delete = |id: i64| {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/watchlist/remove/{}", id))
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, delete(id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("Item {} removed from watchlist.", id));

    let (status, _) = send(&app, delete(id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn watchlist_add_validates_input() {
    let (app, state) = app().await;

    let (status, body) = send(&app, post_json("/watchlist/add", json!({ "email": "a@example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Symbol is required.");

    let (status, body) = send(&app, post_json("/watchlist/add", json!({ "symbol": "AAPL", "email": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid email address.");

    for undeliverable in ["a..b@example.com", "a,b@example.com", "a<b@example.com"] {
        let (status, body) =
            send(&app, post_json("/watchlist/add", json!({ "symbol": "AAPL", "email": undeliverable }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", undeliverable);
        assert_eq!(body["detail"], "Invalid email address.");
    }

    assert!(state.store.full_watchlist().await.unwrap().is_empty());
}

#[tokio::test]
async fn market_data_lists_candles_with_source() {
    let (app, _) = app().await;
    let (status, body) = send(&app, get("/market-data/tesla")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "TSLA");
    assert_eq!(body["source"], "finnhub");
    assert_eq!(body["data"].as_array().unwrap().len(), 60);

    let (app, _) = app_with(None, Config::default()).await;
    let (status, body) = send(&app, get("/market-data/tesla")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Market data not available for 'TSLA'.");
}

#[tokio::test]
async fn sentiment_reports_dominant_label() {
    let (app, _) = app().await;
    let (status, body) = send(&app, get("/sentiment/AAPL")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "symbol": "AAPL",
            "dominant_sentiment": "bearish",
            "confidence": 1.0,
            "source": "Newsdata.io with LLM/Keyword analysis"
        })
    );
}

#[tokio::test]
async fn cache_health_and_metrics() {
    let (app, _) = app().await;
    let (status, body) = send(&app, get("/health/cache")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let res = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("jetbuddy_analyses_total"));
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let mut config = Config::default();
    config.server.cors_allow_origins = "https://app.example".to_string();
    let (app, _) = app_with(Some(sample_candles(30)), config).await;

    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/watchlist/add")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let res = app.clone().oneshot(preflight("https://app.example")).await.unwrap();
    assert_eq!(
        res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example"
    );

    let res = app.clone().oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

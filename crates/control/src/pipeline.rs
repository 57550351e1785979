use crate::notifier::{Notifier, SmtpNotifier};
use crate::store::Store;
use crate::usage::StoreUsageLog;
use chrono::Utc;
use jetbuddy_engines::{
    aggregate_signals, analyze_structure, analyze_trend, estimate_time_and_volatility, position_size,
    predict_take_profit, round_to, stop_loss_level, SignalInputs, TakeProfitInputs,
};
use jetbuddy_market::{
    canonical_symbol, CandleFeed, FinnhubClient, NewsdataClient, OpenRouterClassifier, SentimentAnalyzer,
    TwelveDataClient,
};
use jetbuddy_metrics::{MetricsService, TracingService};
use jetbuddy_models::{AnalysisConfig, AnalysisOutput, AnalysisStatus, Bias, Config, EngineError, MarketData};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const NOT_AVAILABLE: &str = "N/A";

/// Fetch, analyse, cache and notify for one symbol at a time.
pub struct AnalysisPipeline {
    feed: CandleFeed,
    sentiment: SentimentAnalyzer,
    store: Store,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<MetricsService>,
    settings: AnalysisConfig,
    resolution_minutes: u32,
}

impl AnalysisPipeline {
    pub fn new(
        feed: CandleFeed,
        sentiment: SentimentAnalyzer,
        store: Store,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<MetricsService>,
        settings: AnalysisConfig,
        resolution_minutes: u32,
    ) -> Self {
        Self {
            feed,
            sentiment,
            store,
            notifier,
            metrics,
            settings,
            resolution_minutes,
        }
    }

    /// Wires the live provider clients and SMTP notifier from configuration.
    pub fn from_config(config: &Config, store: Store, metrics: Arc<MetricsService>) -> Result<Self, EngineError> {
        let providers = &config.providers;
        let usage = Arc::new(StoreUsageLog::new(store.clone(), metrics.clone()));
        let feed = CandleFeed::new(
            Arc::new(FinnhubClient::new(providers)?),
            Arc::new(TwelveDataClient::new(providers)?),
            usage,
            providers.finnhub_rate_limit,
        );
        let sentiment = SentimentAnalyzer::new(
            Arc::new(NewsdataClient::new(providers)?),
            Arc::new(OpenRouterClassifier::new(providers)?),
        );

        Ok(Self::new(
            feed,
            sentiment,
            store,
            Arc::new(SmtpNotifier::new(config.email.clone())),
            metrics,
            config.analysis.clone(),
            providers.resolution_minutes,
        ))
    }

    pub fn feed(&self) -> &CandleFeed {
        &self.feed
    }

    pub fn sentiment(&self) -> &SentimentAnalyzer {
        &self.sentiment
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Full analysis for `symbol`. Missing market data is reported without touching
    /// the cache; any later failure is cached as an error output.
    #[instrument(skip(self))]
    pub async fn run(&self, symbol: &str) -> Result<AnalysisOutput, EngineError> {
        let symbol = canonical_symbol(symbol);
        let started = Instant::now();
        info!("Running full analysis for {}", symbol);

        let data = match self.feed.fetch(&symbol).await {
            Some(data) => data,
            None => {
                self.metrics.record_failure(&symbol);
                return Err(EngineError::NoMarketData { symbol });
            }
        };

        let output = match self.compute(&symbol, &data).await {
            Ok(output) => output,
            Err(e) => return Err(self.record_failure(&symbol, e).await),
        };
        if let Err(e) = self.store.set_cached_analysis(&output).await {
            return Err(self.record_failure(&symbol, e).await);
        }

        self.notify(&output).await;

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_analysis(&symbol, duration_ms);
        TracingService::log_analysis_completed(&output, &data.source, duration_ms);
        Ok(output)
    }

    async fn record_failure(&self, symbol: &str, error: EngineError) -> EngineError {
        let message = error.to_string();
        TracingService::log_analysis_failed(symbol, &message);
        self.metrics.record_failure(symbol);
        if let Err(e) = self.store.set_cached_analysis(&AnalysisOutput::failed(symbol, &message)).await {
            warn!(error = %e, "Failed to cache error output");
        }
        error
    }

    async fn notify(&self, output: &AnalysisOutput) {
        let recipients = match self.store.emails_for_symbol(&output.symbol).await {
            Ok(recipients) if !recipients.is_empty() => recipients,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Failed to load watchlist recipients");
                return;
            }
        };
        match self.notifier.send_report(output, &recipients).await {
            Ok(true) => self.metrics.record_notification(),
            Ok(false) => TracingService::log_notification_skipped(&output.symbol, "delivery not configured"),
            Err(e) => warn!(error = %e, "Failed to send email report"),
        }
    }

    async fn compute(&self, symbol: &str, data: &MarketData) -> Result<AnalysisOutput, EngineError> {
        let candles = &data.candles;
        let last_close = data
            .last_close()
            .filter(|p| p.is_finite())
            .ok_or_else(|| EngineError::AnalysisFailed {
                message: format!("Latest close for {} is not a usable price", symbol),
            })?;

        let trend = analyze_trend(candles);
        let structure = analyze_structure(candles);
        let sentiment = self.sentiment.analyze(symbol).await;

        let signal = aggregate_signals(SignalInputs {
            trend: trend.trend_direction,
            trend_confidence: trend.confidence,
            sentiment: sentiment.sentiment,
            sentiment_confidence: sentiment.confidence,
            structure: structure.structure_bias,
        });

        let (entry_zone, entry_price) = match &structure.order_block {
            Some(block) => (block.zone.clone(), round_to(block.midpoint(), 5)),
            None => (NOT_AVAILABLE.to_string(), last_close),
        };

        let timing = estimate_time_and_volatility(candles, Some(&entry_zone), self.resolution_minutes);
        let size = position_size(signal.bias_confidence, timing.volatility, self.settings.default_risk_tier);

        let (predicted_tp, sl_level) = if signal.final_bias == Bias::Neutral {
            (None, None)
        } else {
            let tp = predict_take_profit(TakeProfitInputs {
                bias: signal.final_bias,
                confidence: signal.bias_confidence,
                momentum: self.settings.momentum,
                order_block: structure.order_block.as_ref().map(|b| b.midpoint()).unwrap_or(entry_price),
                liquidity_zone: structure
                    .liquidity_level
                    .or(structure.key_level)
                    .unwrap_or(entry_price),
                entry_price,
                risk_ratio: self.settings.reward_risk_ratio,
            });
            let sl = stop_loss_level(
                entry_price,
                signal.final_bias,
                structure.key_level,
                self.settings.stop_loss_ratio,
            );
            (Some(tp.tp_level), Some(sl))
        };

        let mut notes = vec![format!("Data source: {}.", data.source), size.reason.clone()];
        notes.extend(sentiment.reason.iter().map(|r| format!("Sentiment: {}", r)));
        notes.extend(trend.error.iter().map(|e| format!("Trend: {}.", e)));
        notes.extend(structure.error.iter().map(|e| format!("Structure: {}.", e)));
        notes.extend(timing.error.iter().map(|e| format!("Timing: {}.", e)));

        if entry_price.is_finite() {
            Ok(AnalysisOutput {
                symbol: symbol.to_string(),
                trend_direction: signal.final_bias,
                sentiment: sentiment.sentiment,
                bias_confidence: signal.bias_confidence,
                entry_price: Some(entry_price),
                entry_zone,
                estimated_entry_time: timing.estimated_entry_time,
                tp_eta: timing.tp_eta,
                predicted_tp,
                tp_confidence: predicted_tp.map(|_| signal.bias_confidence),
                sl_level,
                volatility: timing.volatility,
                risk_profile: size.risk_profile,
                suggested_lot_size: size.suggested_lot_size,
                status: AnalysisStatus::Ok,
                notes: Some(notes.join(" ")),
                error_message: None,
                generated_at: Utc::now(),
            })
        } else {
            Err(EngineError::AnalysisFailed {
                message: format!("Entry price for {} is not finite", symbol),
            })
        }
    }
}

use jetbuddy_models::EngineError;
use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use tracing::{debug, instrument};

fn internal(e: impl ToString) -> EngineError {
    EngineError::InternalError { reason: e.to_string() }
}

pub struct MetricsService {
    registry: Registry,
    analyses_total: Counter,
    analysis_failures_total: Counter,
    provider_calls_total: CounterVec,
    notifications_total: Counter,
    analysis_duration_ms: Histogram,
}

impl MetricsService {
    pub fn new() -> Result<Self, EngineError> {
        let registry = Registry::new();

        let analyses_total = Counter::new("jetbuddy_analyses_total", "Total number of completed analyses")
            .map_err(internal)?;

        let analysis_failures_total =
            Counter::new("jetbuddy_analysis_failures_total", "Total number of failed analyses").map_err(internal)?;

        let provider_calls_total = CounterVec::new(
            Opts::new("jetbuddy_provider_calls_total", "Outbound market data provider calls"),
            &["provider"],
        )
        .map_err(internal)?;

        let notifications_total =
            Counter::new("jetbuddy_notifications_total", "Total number of e-mail reports sent").map_err(internal)?;

        let analysis_duration_ms = Histogram::with_opts(
            HistogramOpts::new("jetbuddy_analysis_duration_ms", "Full analysis duration in milliseconds")
                .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0]),
        )
        .map_err(internal)?;

        registry.register(Box::new(analyses_total.clone())).map_err(internal)?;
        registry.register(Box::new(analysis_failures_total.clone())).map_err(internal)?;
        registry.register(Box::new(provider_calls_total.clone())).map_err(internal)?;
        registry.register(Box::new(notifications_total.clone())).map_err(internal)?;
        registry.register(Box::new(analysis_duration_ms.clone())).map_err(internal)?;

        Ok(Self {
            registry,
            analyses_total,
            analysis_failures_total,
            provider_calls_total,
            notifications_total,
            analysis_duration_ms,
        })
    }

    #[instrument(skip(self))]
    pub fn record_analysis(&self, symbol: &str, duration_ms: f64) {
        self.analyses_total.inc();
        self.analysis_duration_ms.observe(duration_ms);
        debug!("Recorded analysis for {} - {}ms", symbol, duration_ms);
    }

    #[instrument(skip(self))]
    pub fn record_failure(&self, symbol: &str) {
        self.analysis_failures_total.inc();
        debug!("Recorded analysis failure for {}", symbol);
    }

    pub fn record_provider_call(&self, provider: &str) {
        self.provider_calls_total.with_label_values(&[provider]).inc();
    }

    pub fn record_notification(&self) {
        self.notifications_total.inc();
    }

    pub fn get_prometheus_metrics(&self) -> Result<String, EngineError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer).map_err(internal)?;

        String::from_utf8(buffer).map_err(internal)
    }
}

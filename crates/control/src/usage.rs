use crate::store::Store;
use async_trait::async_trait;
use jetbuddy_market::UsageLog;
use jetbuddy_metrics::MetricsService;
use jetbuddy_models::EngineError;
use std::sync::Arc;

/// Provider call accounting backed by the `api_usage_log` table.
pub struct StoreUsageLog {
    store: Store,
    metrics: Arc<MetricsService>,
}

impl StoreUsageLog {
    pub fn new(store: Store, metrics: Arc<MetricsService>) -> Self {
        Self { store, metrics }
    }
}

#[async_trait]
impl UsageLog for StoreUsageLog {
    async fn record_call(&self, provider: &str) -> Result<(), EngineError> {
        self.metrics.record_provider_call(provider);
        self.store.log_api_call(provider).await
    }

    async fn calls_in_last_minute(&self, provider: &str) -> Result<i64, EngineError> {
        self.store.api_calls_in_last_minute(provider).await
    }
}

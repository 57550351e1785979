use jetbuddy_control::{AnalysisPipeline, Store};
use jetbuddy_metrics::MetricsService;
use jetbuddy_models::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<AnalysisPipeline>,
    pub store: Store,
    pub metrics: Arc<MetricsService>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<AnalysisPipeline>, metrics: Arc<MetricsService>) -> Self {
        let store = pipeline.store().clone();
        Self {
            config,
            pipeline,
            store,
            metrics,
        }
    }
}

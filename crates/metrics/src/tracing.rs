use jetbuddy_models::{AnalysisOutput, LoggingConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` wins over the configured level.
    pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        if config.json {
            builder.json().try_init()?;
        } else {
            builder.try_init()?;
        }

        Ok(())
    }

    pub fn log_analysis_completed(output: &AnalysisOutput, source: &str, duration_ms: f64) {
        info!(
            symbol = %output.symbol,
            bias = %output.trend_direction,
            confidence = output.bias_confidence,
            entry_zone = %output.entry_zone,
            risk_profile = %output.risk_profile,
            source = %source,
            duration_ms = duration_ms,
            "Analysis completed"
        );
    }

    pub fn log_analysis_failed(symbol: &str, error_message: &str) {
        error!(
            symbol = %symbol,
            error_message = %error_message,
            "Analysis failed"
        );
    }

    pub fn log_scheduled_run(job_id: &str, symbols: usize) {
        info!(
            job_id = %job_id,
            symbols = symbols,
            "Scheduled analysis run started"
        );
    }

    pub fn log_notification_skipped(symbol: &str, reason: &str) {
        warn!(
            symbol = %symbol,
            reason = %reason,
            "E-mail report skipped"
        );
    }
}

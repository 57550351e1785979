use crate::pipeline::AnalysisPipeline;
use chrono::{DateTime, Duration, Utc};
use jetbuddy_metrics::TracingService;
use jetbuddy_models::SessionJob;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Next UTC occurrence of `hour:minute` strictly after `now`.
pub fn next_occurrence(now: DateTime<Utc>, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let today = now.date_naive().and_hms_opt(hour, minute, 0)?.and_utc();
    if today > now {
        Some(today)
    } else {
        Some(today + Duration::days(1))
    }
}

/// Earliest upcoming job. Ties keep the job listed first.
pub fn next_job(now: DateTime<Utc>, jobs: &[SessionJob]) -> Option<(DateTime<Utc>, &SessionJob)> {
    jobs.iter()
        .filter_map(|job| next_occurrence(now, job.hour, job.minute).map(|at| (at, job)))
        .fold(None, |best, (at, job)| match best {
            Some((best_at, _)) if best_at <= at => best,
            _ => Some((at, job)),
        })
}

/// Re-runs analysis for every watchlisted symbol ahead of the trading sessions.
pub struct SessionScheduler {
    pipeline: Arc<AnalysisPipeline>,
    jobs: Vec<SessionJob>,
}

impl SessionScheduler {
    pub fn new(pipeline: Arc<AnalysisPipeline>, jobs: Vec<SessionJob>) -> Self {
        Self { pipeline, jobs }
    }

    #[instrument(skip(self))]
    pub async fn start(&self) {
        info!("Scheduler started with {} session jobs (UTC)", self.jobs.len());

        loop {
            let now = Utc::now();
            let Some((at, job)) = next_job(now, &self.jobs) else {
                warn!("No schedulable session jobs, scheduler stopping");
                return;
            };
            let wait = (at - now).to_std().unwrap_or_default();
            info!(job_id = %job.id, next_run = %at, "Waiting for next session job");
            tokio::time::sleep(wait).await;

            self.run_session(&job.id).await;
        }
    }

    /// Analyses each unique watchlist symbol in turn. Returns how many succeeded.
    #[instrument(skip(self))]
    pub async fn run_session(&self, job_id: &str) -> usize {
        let symbols = match self.pipeline.store().unique_symbols().await {
            Ok(symbols) => symbols,
            Err(e) => {
                error!(error = %e, "Failed to load watchlist symbols");
                return 0;
            }
        };
        if symbols.is_empty() {
            info!("Watchlist is empty. Skipping scheduled run.");
            return 0;
        }

        TracingService::log_scheduled_run(job_id, symbols.len());
        let mut succeeded = 0;
        for symbol in &symbols {
            match self.pipeline.run(symbol).await {
                Ok(_) => succeeded += 1,
                Err(e) => error!(symbol = %symbol, error = %e, "Scheduled analysis failed"),
            }
        }
        succeeded
    }
}

use crate::source::HeadlineSource;
use crate::{http_client, provider_error};
use async_trait::async_trait;
use jetbuddy_models::{EngineError, ProvidersConfig};
use serde::Deserialize;
use tracing::{instrument, warn};

pub const PROVIDER: &str = "newsdata";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Clone)]
pub struct NewsdataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_headlines: usize,
}

impl NewsdataClient {
    pub fn new(config: &ProvidersConfig) -> Result<Self, EngineError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.newsdata_base_url.trim_end_matches('/').to_string(),
            api_key: config.newsdata_api_key.clone(),
            max_headlines: config.max_headlines,
        })
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<String>, EngineError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error(PROVIDER, "API key not configured"))?;

        let body: NewsResponse = self
            .client
            .get(format!("{}/news", self.base_url))
            .query(&[("apikey", key), ("q", symbol), ("language", "en"), ("category", "business")])
            .send()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| provider_error(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?;

        if body.status != "success" {
            return Ok(Vec::new());
        }
        Ok(body
            .results
            .into_iter()
            .filter_map(|a| a.title)
            .take(self.max_headlines)
            .collect())
    }
}

#[async_trait]
impl HeadlineSource for NewsdataClient {
    #[instrument(skip(self))]
    async fn headlines(&self, symbol: &str) -> Vec<String> {
        match self.fetch(symbol).await {
            Ok(headlines) => headlines,
            Err(e) => {
                warn!(error = %e, "Error fetching news headlines");
                Vec::new()
            }
        }
    }
}

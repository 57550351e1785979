use crate::source::HeadlineClassifier;
use crate::{http_client, provider_error};
use async_trait::async_trait;
use jetbuddy_engines::{classify_keywords, classify_llm_reply};
use jetbuddy_models::{Bias, EngineError, ProvidersConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PROVIDER: &str = "openrouter";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Classifies by keyword lists alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

#[async_trait]
impl HeadlineClassifier for KeywordClassifier {
    async fn classify(&self, headline: &str, _symbol: &str) -> Bias {
        classify_keywords(headline)
    }
}

/// Chat-completion classification, falling back to keywords on any failure.
#[derive(Clone)]
pub struct OpenRouterClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenRouterClassifier {
    pub fn new(config: &ProvidersConfig) -> Result<Self, EngineError> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            base_url: config.openrouter_base_url.trim_end_matches('/').to_string(),
            api_key: config.openrouter_api_key.clone(),
            model: config.openrouter_model.clone(),
        })
    }

    async fn ask(&self, headline: &str, symbol: &str) -> Result<String, EngineError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| provider_error(PROVIDER, "API key not configured"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!(
                    "Classify this headline for {} as exactly one word: Bullish, Bearish, or Neutral. Headline: '{}'",
                    symbol, headline
                ),
            }],
        };

        let mut body: ChatResponse = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| provider_error(PROVIDER, e))?
            .json()
            .await
            .map_err(|e| provider_error(PROVIDER, e))?;

        if body.choices.is_empty() {
            return Err(provider_error(PROVIDER, "empty completion"));
        }
        Ok(body.choices.swap_remove(0).message.content)
    }
}

#[async_trait]
impl HeadlineClassifier for OpenRouterClassifier {
    async fn classify(&self, headline: &str, symbol: &str) -> Bias {
        match self.ask(headline, symbol).await {
            Ok(reply) => classify_llm_reply(&reply),
            Err(e) => {
                warn!(error = %e, "OpenRouter classification failed, falling back to keyword analysis");
                classify_keywords(headline)
            }
        }
    }
}

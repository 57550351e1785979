use crate::source::{HeadlineClassifier, HeadlineSource};
use futures::future::join_all;
use jetbuddy_engines::{summarize, SentimentSummary};
use std::sync::Arc;
use tracing::{debug, instrument};

/// News sentiment: fetch headlines, classify each, take the dominant label.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    headlines: Arc<dyn HeadlineSource>,
    classifier: Arc<dyn HeadlineClassifier>,
}

impl SentimentAnalyzer {
    pub fn new(headlines: Arc<dyn HeadlineSource>, classifier: Arc<dyn HeadlineClassifier>) -> Self {
        Self { headlines, classifier }
    }

    #[instrument(skip(self))]
    pub async fn analyze(&self, symbol: &str) -> SentimentSummary {
        let headlines = self.headlines.headlines(symbol).await;
        let labels = join_all(headlines.iter().map(|h| self.classifier.classify(h, symbol))).await;
        let summary = summarize(&labels);
        debug!(headlines = headlines.len(), sentiment = %summary.sentiment, "Sentiment analysed");
        summary
    }
}

use crate::round_to;
use jetbuddy_models::Bias;
use serde::Serialize;

const BULLISH_KEYWORDS: &[&str] = &["up", "rises", "beats", "gains", "strong", "upgrade", "optimistic"];
const BEARISH_KEYWORDS: &[&str] = &["down", "falls", "misses", "losses", "weak", "downgrade", "panic"];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SentimentSummary {
    pub sentiment: Bias,
    pub confidence: f64,
    pub reason: Option<String>,
}

/// Keyword fallback used when no language model answer is available.
pub fn classify_keywords(headline: &str) -> Bias {
    let lower = headline.to_lowercase();
    if BULLISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Bias::Bullish
    } else if BEARISH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Maps a free-text model reply onto a label.
pub fn classify_llm_reply(reply: &str) -> Bias {
    let lower = reply.to_lowercase();
    if lower.contains("bullish") {
        Bias::Bullish
    } else if lower.contains("bearish") {
        Bias::Bearish
    } else {
        Bias::Neutral
    }
}

/// Dominant label and its share. Ties go to the label seen first.
pub fn summarize(labels: &[Bias]) -> SentimentSummary {
    if labels.is_empty() {
        return SentimentSummary {
            sentiment: Bias::Neutral,
            confidence: 1.0,
            reason: Some("No headlines found.".to_string()),
        };
    }

    let mut counts: Vec<(Bias, usize)> = Vec::with_capacity(3);
    for label in labels {
        match counts.iter_mut().find(|(b, _)| b == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((*label, 1)),
        }
    }

    let (dominant, count) = counts
        .iter()
        .fold(counts[0], |best, &cur| if cur.1 > best.1 { cur } else { best });

    SentimentSummary {
        sentiment: dominant,
        confidence: round_to(count as f64 / labels.len() as f64, 2),
        reason: None,
    }
}

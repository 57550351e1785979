use crate::round_to;
use jetbuddy_models::Bias;
use serde::Serialize;

const TREND_WEIGHT: f64 = 0.5;
const SENTIMENT_WEIGHT: f64 = 0.2;
const STRUCTURE_WEIGHT: f64 = 0.3;

/// The three directional inputs to fuse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub trend: Bias,
    pub trend_confidence: f64,
    pub sentiment: Bias,
    pub sentiment_confidence: f64,
    pub structure: Bias,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct ComponentScores {
    pub bullish: f64,
    pub bearish: f64,
}

impl ComponentScores {
    fn add(&mut self, bias: Bias, confidence: f64, weight: f64) {
        match bias {
            Bias::Bullish => self.bullish += confidence * weight,
            Bias::Bearish => self.bearish += confidence * weight,
            Bias::Neutral => {}
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct AggregatedSignal {
    pub final_bias: Bias,
    pub bias_confidence: f64,
    pub component_scores: ComponentScores,
}

/// Percentages (values above 1) are scaled down to a 0..=1 fraction.
fn as_fraction(confidence: f64) -> f64 {
    if confidence > 1.0 {
        confidence / 100.0
    } else {
        confidence
    }
}

/// Weighted vote of trend, sentiment and structure.
pub fn aggregate_signals(inputs: SignalInputs) -> AggregatedSignal {
    let mut scores = ComponentScores::default();

    scores.add(inputs.trend, as_fraction(inputs.trend_confidence), TREND_WEIGHT);
    scores.add(inputs.sentiment, as_fraction(inputs.sentiment_confidence), SENTIMENT_WEIGHT);
    // a detected structure counts fully
    scores.add(inputs.structure, 1.0, STRUCTURE_WEIGHT);

    let (final_bias, confidence) = if scores.bullish > scores.bearish {
        (Bias::Bullish, scores.bullish)
    } else if scores.bearish > scores.bullish {
        (Bias::Bearish, scores.bearish)
    } else {
        (Bias::Neutral, 1.0 - scores.bullish.max(scores.bearish))
    };

    AggregatedSignal {
        final_bias,
        bias_confidence: round_to(confidence.min(1.0), 2),
        component_scores: scores,
    }
}

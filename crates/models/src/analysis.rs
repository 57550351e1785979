use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Bullish => "bullish",
            Bias::Bearish => "bearish",
            Bias::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bullish" => Ok(Bias::Bullish),
            "bearish" => Ok(Bias::Bearish),
            "neutral" => Ok(Bias::Neutral),
            other => Err(format!("Invalid bias: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Moderate,
    High,
    Unknown,
}

impl Volatility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volatility::Low => "low",
            Volatility::Moderate => "moderate",
            Volatility::High => "high",
            Volatility::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Conservative,
    Medium,
    Aggressive,
}

impl RiskTier {
    pub fn lot_size(&self) -> f64 {
        match self {
            RiskTier::Conservative => 0.01,
            RiskTier::Medium => 0.10,
            RiskTier::Aggressive => 1.00,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Conservative => "conservative",
            RiskTier::Medium => "medium",
            RiskTier::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Ok,
    Error,
}

/// Full signal for one symbol, as cached and served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOutput {
    pub symbol: String,
    pub trend_direction: Bias,
    pub sentiment: Bias,
    pub bias_confidence: f64,
    pub entry_price: Option<f64>,
    pub entry_zone: String,
    pub estimated_entry_time: String,
    pub tp_eta: String,
    #[serde(default)]
    pub predicted_tp: Option<f64>,
    #[serde(default)]
    pub tp_confidence: Option<f64>,
    #[serde(default)]
    pub sl_level: Option<f64>,
    pub volatility: Volatility,
    pub risk_profile: RiskTier,
    pub suggested_lot_size: f64,
    #[serde(default)]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisOutput {
    /// Placeholder stored when a run fails after it was requested, so readers see the error.
    pub fn failed(symbol: &str, message: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            trend_direction: Bias::Neutral,
            sentiment: Bias::Neutral,
            bias_confidence: 0.0,
            entry_price: None,
            entry_zone: "N/A".to_string(),
            estimated_entry_time: "N/A".to_string(),
            tp_eta: "N/A".to_string(),
            predicted_tp: None,
            tp_confidence: None,
            sl_level: None,
            volatility: Volatility::Unknown,
            risk_profile: RiskTier::Conservative,
            suggested_lot_size: 0.0,
            status: AnalysisStatus::Error,
            notes: None,
            error_message: Some(message.into()),
            generated_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == AnalysisStatus::Error
    }
}

use jetbuddy_models::{RiskTier, Volatility};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PositionSize {
    pub risk_profile: RiskTier,
    pub suggested_lot_size: f64,
    pub reason: String,
}

/// Fixed-tier sizing: low confidence or high volatility forces the conservative
/// tier, strong confidence unlocks the aggressive one.
pub fn position_size(confidence: f64, volatility: Volatility, default_tier: RiskTier) -> PositionSize {
    let (tier, why) = if confidence < 0.4 {
        (RiskTier::Conservative, "Low confidence score (< 0.4).".to_string())
    } else if volatility == Volatility::High {
        (RiskTier::Conservative, "High market volatility.".to_string())
    } else if confidence > 0.75 {
        (RiskTier::Aggressive, "High confidence score (> 0.75).".to_string())
    } else {
        (
            default_tier,
            format!("Confidence score {} with {} volatility.", confidence, volatility),
        )
    };

    PositionSize {
        risk_profile: tier,
        suggested_lot_size: tier.lot_size(),
        reason: format!("{} Applying '{}' risk tier.", why, tier),
    }
}

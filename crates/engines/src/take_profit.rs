use crate::round_to;
use jetbuddy_models::Bias;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakeProfitInputs {
    pub bias: Bias,
    /// Fused confidence in 0..=1.
    pub confidence: f64,
    pub momentum: f64,
    pub order_block: f64,
    pub liquidity_zone: f64,
    pub entry_price: f64,
    /// Reward-to-risk ratio.
    pub risk_ratio: f64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TakeProfit {
    pub bias: Bias,
    pub tp_level: f64,
    pub sl_level: f64,
    pub confidence: f64,
}

/// Anchors the target on the farther of the order block and the liquidity level,
/// pushed out by momentum-weighted confidence.
pub fn predict_take_profit(inputs: TakeProfitInputs) -> TakeProfit {
    let entry = inputs.entry_price;
    let push = inputs.momentum * inputs.confidence / 100.0;

    let (tp_level, sl_level) = match inputs.bias {
        Bias::Bullish => {
            let tp = inputs.order_block.max(inputs.liquidity_zone) + push;
            (tp, entry - (tp - entry) / inputs.risk_ratio)
        }
        Bias::Bearish => {
            let tp = inputs.order_block.min(inputs.liquidity_zone) - push;
            (tp, entry + (entry - tp) / inputs.risk_ratio)
        }
        Bias::Neutral => (entry, entry),
    };

    TakeProfit {
        bias: inputs.bias,
        tp_level: round_to(tp_level, 4),
        sl_level: round_to(sl_level, 4),
        confidence: inputs.confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(bias: Bias) -> TakeProfitInputs {
        TakeProfitInputs {
            bias,
            confidence: 0.5,
            momentum: 1.0,
            order_block: 1.1000,
            liquidity_zone: 1.1050,
            entry_price: 1.1000,
            risk_ratio: 2.0,
        }
    }

    #[test]
    fn bullish_targets_above_the_higher_anchor() {
        let tp = predict_take_profit(inputs(Bias::Bullish));
        // 1.1050 + 0.005
        assert_eq!(tp.tp_level, 1.11);
        // 1.1 - 0.01 / 2
        assert_eq!(tp.sl_level, 1.095);
    }

    #[test]
    fn bearish_targets_below_the_lower_anchor() {
        let tp = predict_take_profit(inputs(Bias::Bearish));
        assert_eq!(tp.tp_level, 1.095);
        assert_eq!(tp.sl_level, 1.1025);
    }

    #[test]
    fn neutral_stays_at_entry() {
        let tp = predict_take_profit(inputs(Bias::Neutral));
        assert_eq!(tp.tp_level, 1.1);
        assert_eq!(tp.sl_level, 1.1);
    }
}

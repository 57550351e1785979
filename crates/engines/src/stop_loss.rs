use crate::round_to;
use jetbuddy_models::Bias;

/// Stop placed a fraction of the entry-to-key-level distance beyond the entry.
pub fn stop_loss_level(entry_price: f64, bias: Bias, key_level: Option<f64>, risk_ratio: f64) -> f64 {
    let key_level = key_level.unwrap_or(entry_price);
    let buffer = (entry_price - key_level).abs() / risk_ratio;

    let sl = match bias {
        Bias::Bullish => entry_price - buffer,
        Bias::Bearish => entry_price + buffer,
        Bias::Neutral => entry_price,
    };
    round_to(sl, 4)
}

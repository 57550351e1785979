//! Pure analysis over OHLCV candles. Nothing here performs I/O.

pub mod aggregator;
pub mod kalman;
pub mod risk;
pub mod sentiment;
pub mod smc;
pub mod stop_loss;
pub mod take_profit;
pub mod timing;
pub mod trend;
pub mod wavelet;

pub use aggregator::*;
pub use risk::*;
pub use sentiment::*;
pub use smc::*;
pub use stop_loss::*;
pub use take_profit::*;
pub use timing::*;
pub use trend::*;

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
pub(crate) mod test_candles {
    use chrono::{Duration, TimeZone, Utc};
    use jetbuddy_models::Candle;

    /// 15-minute candles with the given closes; each opens at the previous close.
    pub fn from_closes(closes: &[f64], spread: f64) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut prev = closes.first().copied().unwrap_or(0.0);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = prev;
                prev = close;
                Candle {
                    timestamp: start + Duration::minutes(15 * i as i64),
                    open,
                    high: open.max(close) + spread,
                    low: open.min(close) - spread,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    pub fn linear(n: usize, start: f64, step: f64) -> Vec<Candle> {
        let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        from_closes(&closes, step.abs().max(0.0001) / 2.0)
    }
}

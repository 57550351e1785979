use crate::kalman::{ema_smooth, KalmanFilter};
use crate::{round_to, wavelet};
use jetbuddy_models::{Bias, Candle};
use serde::Serialize;
use tracing::warn;

pub const MIN_TREND_CANDLES: usize = 20;
const WAVELET_LEVEL: usize = 2;
const SLOPE_WINDOW: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendAnalysis {
    pub trend_direction: Bias,
    pub confidence: f64,
    pub slope: Option<f64>,
    pub threshold: Option<f64>,
    pub error: Option<String>,
}

impl TrendAnalysis {
    fn neutral(error: &str) -> Self {
        Self {
            trend_direction: Bias::Neutral,
            confidence: 0.0,
            slope: None,
            threshold: None,
            error: Some(error.to_string()),
        }
    }
}

/// Least-squares slope of `ys` against `0..n`.
pub fn linear_slope(ys: &[f64]) -> f64 {
    let n = ys.len() as f64;
    if ys.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (mut num, mut den) = (0.0, 0.0);
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}

/// Denoise closes, smooth them, and classify the slope of the last few points.
pub fn analyze_trend(candles: &[Candle]) -> TrendAnalysis {
    if candles.len() < MIN_TREND_CANDLES {
        return TrendAnalysis::neutral("Not enough data for trend analysis");
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let mut denoised = wavelet::denoise(&closes, WAVELET_LEVEL);
    if denoised.iter().any(|v| !v.is_finite()) {
        warn!("Wavelet transform produced non-finite values, using original prices");
        denoised = closes.clone();
    }

    let mut smoothed = KalmanFilter::default().filter(&denoised);
    if smoothed.iter().any(|v| !v.is_finite()) {
        warn!("Kalman filter produced non-finite values, using exponential smoothing");
        smoothed = ema_smooth(&denoised, 0.1);
    }

    let tail = &smoothed[smoothed.len().saturating_sub(SLOPE_WINDOW)..];
    if tail.len() < 2 {
        return TrendAnalysis::neutral("Insufficient smoothed data points");
    }
    let slope = linear_slope(tail);

    let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
    let price_range = max - min;
    if price_range == 0.0 {
        return TrendAnalysis::neutral("No price movement detected");
    }

    let normalized_slope = slope / (price_range / closes.len() as f64);
    let mut confidence = (normalized_slope.abs() * 10.0).min(1.0);

    let avg_change = closes.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>() / (closes.len() - 1) as f64;
    let threshold = 0.05 * avg_change;

    let trend_direction = if slope > threshold {
        Bias::Bullish
    } else if slope < -threshold {
        Bias::Bearish
    } else {
        confidence = 1.0 - confidence;
        Bias::Neutral
    };

    TrendAnalysis {
        trend_direction,
        confidence: round_to(confidence, 2),
        slope: Some(round_to(slope, 6)),
        threshold: Some(round_to(threshold, 6)),
        error: None,
    }
}

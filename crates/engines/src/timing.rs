use jetbuddy_models::{Candle, Volatility};
use serde::Serialize;

pub const MIN_TIMING_CANDLES: usize = 10;
const ATR_PERIOD: usize = 14;
const HIGH_RELATIVE_ATR: f64 = 0.005;
const MODERATE_RELATIVE_ATR: f64 = 0.002;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimingEstimate {
    pub estimated_entry_time: String,
    pub tp_eta: String,
    pub best_entry_zone: String,
    pub volatility: Volatility,
    pub error: Option<String>,
}

impl TimingEstimate {
    fn unavailable(entry_zone: Option<&str>, volatility: Volatility, value: &str, error: Option<String>) -> Self {
        Self {
            estimated_entry_time: value.to_string(),
            tp_eta: value.to_string(),
            best_entry_zone: entry_zone.unwrap_or(NOT_AVAILABLE).to_string(),
            volatility,
            error,
        }
    }
}

/// Parses `"low -- high"` into its bounds, in the order written.
pub fn parse_zone(zone: &str) -> Result<(f64, f64), String> {
    let mut parts = zone.split("--").map(|p| p.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok((a, b)),
        (Some(Ok(a)), None, None) => Ok((a, a)),
        _ => Err(format!("could not parse entry zone '{}'", zone)),
    }
}

fn usable_zone(zone: Option<&str>) -> Option<&str> {
    zone.filter(|z| !z.is_empty() && *z != NOT_AVAILABLE)
}

/// Average of the last `period` true ranges, or `None` with too little history.
pub fn average_true_range(candles: &[Candle], period: usize) -> Option<f64> {
    if candles.len() < period || period == 0 {
        return None;
    }
    let true_ranges: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let hl = c.high - c.low;
            match i.checked_sub(1).map(|p| candles[p].close) {
                Some(prev) => hl.max((c.high - prev).abs()).max((c.low - prev).abs()),
                None => hl,
            }
        })
        .collect();
    let tail = &true_ranges[true_ranges.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

pub fn classify_volatility(candles: &[Candle]) -> Volatility {
    let Some(last) = candles.last() else {
        return Volatility::Unknown;
    };
    match average_true_range(candles, ATR_PERIOD) {
        Some(atr) if last.close != 0.0 => {
            let relative = atr / last.close;
            if relative > HIGH_RELATIVE_ATR {
                Volatility::High
            } else if relative > MODERATE_RELATIVE_ATR {
                Volatility::Moderate
            } else {
                Volatility::Low
            }
        }
        _ => Volatility::Low,
    }
}

fn format_entry_eta(minutes: f64) -> String {
    if minutes < 60.0 {
        format!("in ~{} minutes", minutes as i64)
    } else {
        format!("in ~{:.1} hours", minutes / 60.0)
    }
}

/// Candle-velocity estimate of when price reaches the entry zone and a take-profit
/// twice as far, plus an ATR volatility tier.
pub fn estimate_time_and_volatility(
    candles: &[Candle],
    entry_zone: Option<&str>,
    resolution_minutes: u32,
) -> TimingEstimate {
    if candles.len() < MIN_TIMING_CANDLES {
        return TimingEstimate::unavailable(entry_zone, Volatility::Unknown, NOT_AVAILABLE, None);
    }

    let avg_candle_size = candles.iter().map(Candle::range).sum::<f64>() / candles.len() as f64;
    if avg_candle_size == 0.0 {
        return TimingEstimate::unavailable(entry_zone, Volatility::Low, NOT_AVAILABLE, None);
    }

    let current_price = candles[candles.len() - 1].close;
    let minutes_per_candle = resolution_minutes as f64;

    let (estimated_entry_time, tp_eta) = match usable_zone(entry_zone) {
        Some(zone) => match parse_zone(zone) {
            Ok((first, second)) => {
                let entry_price = (first + second) / 2.0;
                let entry_minutes = (current_price - entry_price).abs() / avg_candle_size * minutes_per_candle;

                let tp_distance = 2.0 * (first - current_price).abs();
                let tp_minutes = tp_distance / avg_candle_size * minutes_per_candle;

                (format_entry_eta(entry_minutes), format!("within {:.1} hours", tp_minutes / 60.0))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Timing estimate failed");
                return TimingEstimate::unavailable(entry_zone, Volatility::Unknown, "Error", Some(e));
            }
        },
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    TimingEstimate {
        estimated_entry_time,
        tp_eta,
        best_entry_zone: entry_zone.unwrap_or(NOT_AVAILABLE).to_string(),
        volatility: classify_volatility(candles),
        error: None,
    }
}

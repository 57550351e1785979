//! Market-structure detection from OHLCV: swing points, breaks of structure (BOS)
//! and the order block that preceded the break.

use jetbuddy_models::{Bias, Candle};
use serde::Serialize;

pub const MIN_STRUCTURE_CANDLES: usize = 25;
/// Candles on each side of a swing point.
pub const SWING_WINDOW: usize = 5;
const ORDER_BLOCK_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderBlock {
    pub kind: Bias,
    pub low: f64,
    pub high: f64,
    pub zone: String,
}

impl OrderBlock {
    fn from_candle(kind: Bias, candle: &Candle) -> Self {
        Self {
            kind,
            low: candle.low,
            high: candle.high,
            zone: format_zone(candle.low, candle.high),
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }
}

pub fn format_zone(low: f64, high: f64) -> String {
    format!("{:.4} -- {:.4}", low, high)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StructureAnalysis {
    pub structure_bias: Bias,
    /// Direction of the break of structure, if any.
    pub bos: Option<Bias>,
    pub order_block: Option<OrderBlock>,
    /// Swing level the last close broke through.
    pub key_level: Option<f64>,
    /// Most recent swing level on the side of the bias, where resting orders sit.
    pub liquidity_level: Option<f64>,
    pub error: Option<String>,
}

impl StructureAnalysis {
    fn neutral(error: Option<&str>) -> Self {
        Self {
            structure_bias: Bias::Neutral,
            bos: None,
            order_block: None,
            key_level: None,
            liquidity_level: None,
            error: error.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Swing {
    index: usize,
    price: f64,
}

fn first_extreme_at_center(values: impl Iterator<Item = f64>, better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.enumerate() {
        match best {
            Some((_, b)) if !better(v, b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Candle `i` is a swing high when it holds the first maximum of `[i - n, i + n]`.
/// Candles without a full window on both sides never qualify.
fn find_swings(candles: &[Candle], n: usize) -> (Vec<Swing>, Vec<Swing>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    if candles.len() < 2 * n + 1 {
        return (highs, lows);
    }
    for i in n..candles.len() - n {
        let window = &candles[i - n..=i + n];
        if first_extreme_at_center(window.iter().map(|c| c.high), |v, b| v > b) == Some(n) {
            highs.push(Swing { index: i, price: candles[i].high });
        }
        if first_extreme_at_center(window.iter().map(|c| c.low), |v, b| v < b) == Some(n) {
            lows.push(Swing { index: i, price: candles[i].low });
        }
    }
    (highs, lows)
}

/// Last opposite-colour candle in the few candles before the breaking candle.
fn find_order_block(candles: &[Candle], swing: Swing, kind: Bias) -> Option<OrderBlock> {
    let breaks = |c: &Candle| match kind {
        Bias::Bullish => c.high > swing.price,
        _ => c.low < swing.price,
    };
    let break_index = candles.iter().skip(swing.index + 1).position(breaks)? + swing.index + 1;

    let start = break_index.saturating_sub(ORDER_BLOCK_LOOKBACK);
    let end = (start + ORDER_BLOCK_LOOKBACK).min(candles.len());
    candles[start..end]
        .iter()
        .rev()
        .find(|c| match kind {
            Bias::Bullish => c.is_bearish(),
            _ => c.is_bullish(),
        })
        .map(|c| OrderBlock::from_candle(kind, c))
}

pub fn analyze_structure(candles: &[Candle]) -> StructureAnalysis {
    if candles.len() < MIN_STRUCTURE_CANDLES {
        return StructureAnalysis::neutral(Some("Not enough data"));
    }

    let (highs, lows) = find_swings(candles, SWING_WINDOW);
    let current_close = candles[candles.len() - 1].close;

    let prior_high = (highs.len() > 1).then(|| highs[highs.len() - 2]);
    let prior_low = (lows.len() > 1).then(|| lows[lows.len() - 2]);

    let (bias, swing) = match (prior_high, prior_low) {
        (Some(high), _) if current_close > high.price => (Bias::Bullish, high),
        (_, Some(low)) if current_close < low.price => (Bias::Bearish, low),
        _ => return StructureAnalysis::neutral(None),
    };

    let liquidity_level = match bias {
        Bias::Bullish => highs.last().map(|s| s.price),
        _ => lows.last().map(|s| s.price),
    };

    StructureAnalysis {
        structure_bias: bias,
        bos: Some(bias),
        order_block: find_order_block(candles, swing, bias),
        key_level: Some(swing.price),
        liquidity_level,
        error: None,
    }
}

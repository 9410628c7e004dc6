//! Shared thresholds, ingestion and scoring for the reversal detectors.

use crate::shape::{ShadowSide, Shape};
use crate::trend::{TrendConfig, TrendDirection, TrendTracker, TrendVerdict};
use crate::window::Window;
use crate::{Candle, Direction, PatternInfo, PatternKind, PatternResult, Ratio, Result};

// ============================================================
// DEFAULT THRESHOLDS
// ============================================================

/// Hammer family: body <= range * BODY_RATIO
pub const HAMMER_BODY_RATIO: f64 = 0.3;
/// Hammer family: measured shadow >= body * SHADOW_RATIO
pub const HAMMER_SHADOW_RATIO: f64 = 2.0;
/// Hammer family: opposite shadow <= body * OPPOSITE_SHADOW_FACTOR
///
/// The reference hammer (upper shadow 0.2, body 0.3) needs at least 0.67 and
/// the reference inverted hammer (lower shadow 0.1, body 0.3) at least 0.34;
/// 0.7 is the tightest round factor admitting both.
pub const OPPOSITE_SHADOW_FACTOR: f64 = 0.7;
/// Doji: body <= range * DOJI_BODY_RATIO
pub const DOJI_BODY_RATIO: f64 = 0.1;

// ============================================================
// ADMISSION
// ============================================================

/// Shape half of the hammer / inverted hammer rule.
///
/// `side` is the long shadow; the other one must stay within
/// `body * opposite_factor`. Bearish candles never qualify.
#[inline]
pub fn admits_hammer_shape(
    shape: &Shape,
    side: ShadowSide,
    body_ratio_threshold: f64,
    shadow_ratio_threshold: f64,
    opposite_factor: f64,
) -> bool {
    shape.body_ratio <= body_ratio_threshold
        && shape.shadow_ratio(side) >= shadow_ratio_threshold
        && shape.shadow(side.opposite()) <= shape.body * opposite_factor
        && shape.is_bullish
}

/// Signal a reversal candle gives once the trend it follows is confirmed.
#[inline]
pub fn reversal_direction(kind: PatternKind, trend: TrendDirection) -> Direction {
    match (kind, trend) {
        (PatternKind::Doji, _) => Direction::Neutral,
        (_, TrendDirection::Down) => Direction::Bullish,
        (_, TrendDirection::Up) => Direction::Bearish,
    }
}

// ============================================================
// CONFIDENCE
// ============================================================

/// Tighter-than-threshold shadow and smaller-than-threshold body score higher.
#[inline]
pub fn shadow_pattern_confidence(
    shadow_ratio: f64,
    shadow_ratio_threshold: f64,
    body_ratio: f64,
    body_ratio_threshold: f64,
) -> f64 {
    if shadow_ratio <= 0.0 || body_ratio_threshold <= 0.0 {
        return 0.0;
    }
    ((shadow_ratio_threshold / shadow_ratio) * (body_ratio / body_ratio_threshold)).min(1.0)
}

#[inline]
pub fn doji_pattern_confidence(body_ratio: f64, body_ratio_threshold: f64) -> f64 {
    if body_ratio_threshold <= 0.0 {
        return 0.0;
    }
    (1.0 - body_ratio / body_ratio_threshold).clamp(0.0, 1.0)
}

/// Unweighted mean of shape quality and trend magnitude.
#[inline]
pub fn blend_confidence(pattern_confidence: f64, trend: &TrendVerdict) -> Ratio {
    Ratio::saturating((pattern_confidence + trend.magnitude()) / 2.0)
}

// ============================================================
// INGESTION
// ============================================================

/// Push `candle` into `window` and evaluate the trend over the bars before it.
///
/// The window is resized first if the trend lookback was reconfigured.
pub(crate) fn ingest(
    window: &mut Window,
    trend: &TrendConfig,
    kind: PatternKind,
    symbol: &str,
    candle: Candle,
) -> Result<(Shape, TrendVerdict)> {
    let capacity = trend.trend_periods.get() + 1;
    if window.capacity() != capacity {
        window.set_capacity(capacity);
    }

    if let Some(last) = window.latest() {
        if candle.timestamp < last.timestamp {
            tracing::warn!(
                symbol,
                pattern = %kind,
                previous = %last.timestamp,
                current = %candle.timestamp,
                "bar timestamp went backwards"
            );
        }
    }

    window.push(candle);
    let shape = Shape::of(&candle);
    let verdict = TrendTracker::new(*trend).evaluate(window.history())?;

    tracing::trace!(
        symbol,
        pattern = %kind,
        buffered = window.len(),
        in_trend = verdict.in_trend,
        strength = verdict.strength,
        "bar evaluated"
    );

    Ok((shape, verdict))
}

/// Assemble the result for one bar.
pub(crate) fn finish(
    kind: PatternKind,
    symbol: &str,
    candle: &Candle,
    shape: Shape,
    shadow_ratio: Option<f64>,
    trend: TrendVerdict,
    pattern_confidence: Option<f64>,
) -> PatternResult {
    let is_detected = pattern_confidence.is_some();
    let pattern_confidence = pattern_confidence.unwrap_or(0.0);
    let confidence = if is_detected {
        blend_confidence(pattern_confidence, &trend)
    } else {
        Ratio::ZERO
    };

    if is_detected {
        tracing::debug!(
            symbol,
            pattern = %kind,
            confidence = confidence.get(),
            timestamp = %candle.timestamp,
            "pattern detected"
        );
    }

    PatternResult {
        pattern: kind,
        is_detected,
        confidence,
        timestamp: candle.timestamp,
        symbol: symbol.to_string(),
        additional_info: PatternInfo {
            body: shape.body,
            total_height: shape.total_height,
            body_ratio: shape.body_ratio,
            upper_shadow: shape.upper_shadow,
            lower_shadow: shape.lower_shadow,
            shadow_ratio,
            is_bullish: shape.is_bullish,
            pattern_confidence,
            trend,
        },
    }
}

/// Reject non-finite or non-positive thresholds.
pub(crate) fn positive_threshold(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(crate::PatternError::InvalidConfig(format!(
            "{field} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

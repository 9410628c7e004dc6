//! Trend tracking over a lookback of confirmed bars.
//!
//! A qualifying trend needs both an aggregate move (endpoint-to-endpoint
//! percentage change of at least `min_trend_strength`) and structural
//! persistence: at least `min_consecutive` with-trend bars ending at the newest
//! bar, and no run of reversal candles longer than `max_reversal_candles`.

use serde::{Deserialize, Serialize};

use crate::{PatternError, Period, Ratio, Result, OHLCV, OHLCVExt};

pub const DEFAULT_TREND_PERIODS: usize = 5;
pub const DEFAULT_MIN_TREND_STRENGTH: f64 = 0.002;
pub const DEFAULT_MAX_REVERSAL_CANDLES: usize = 3;
pub const DEFAULT_MIN_CONSECUTIVE: usize = 3;

/// Direction of the trend a detector requires before its reversal candle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    #[default]
    Down,
    Up,
}

impl TrendDirection {
    /// Whether a single bar moves with this trend.
    #[inline]
    pub fn is_with_trend<T: OHLCV>(self, bar: &T) -> bool {
        match self {
            TrendDirection::Down => bar.is_bearish(),
            TrendDirection::Up => bar.is_bullish(),
        }
    }
}

/// Trend-gating parameters shared by all detectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub trend_periods: Period,
    pub min_trend_strength: Ratio,
    pub max_reversal_candles: usize,
    pub min_consecutive: usize,
    pub direction: TrendDirection,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            trend_periods: Period::new_const(DEFAULT_TREND_PERIODS),
            min_trend_strength: Ratio::new_const(DEFAULT_MIN_TREND_STRENGTH),
            max_reversal_candles: DEFAULT_MAX_REVERSAL_CANDLES,
            min_consecutive: DEFAULT_MIN_CONSECUTIVE,
            direction: TrendDirection::Down,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> Result<()> {
        let periods = self.trend_periods.get();
        if self.min_consecutive == 0 || self.min_consecutive > periods {
            return Err(PatternError::InvalidConfig(format!(
                "min_consecutive = {} must be within 1..={periods}",
                self.min_consecutive
            )));
        }
        Ok(())
    }
}

/// Outcome of a trend evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendVerdict {
    pub in_trend: bool,
    /// Signed endpoint move in the configured direction; positive means the
    /// market moved the way the trend requires.
    pub strength: f64,
    /// With-trend bars ending at the newest bar of the lookback.
    pub consecutive_at_end: usize,
    /// Longest run of reversal candles inside the lookback.
    pub max_reversal_run: usize,
    /// Bars actually evaluated (0 when history was insufficient).
    pub lookback: usize,
}

impl TrendVerdict {
    /// Verdict for a lookback that has not filled yet.
    pub const fn insufficient() -> Self {
        Self {
            in_trend: false,
            strength: 0.0,
            consecutive_at_end: 0,
            max_reversal_run: 0,
            lookback: 0,
        }
    }

    /// Trend magnitude normalised to `[0, 1]` for confidence blending.
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.strength.abs().min(1.0)
    }
}

/// Evaluates a trend over the last `trend_periods` bars of a series.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendTracker {
    config: TrendConfig,
}

impl TrendTracker {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Evaluate the trend over the tail of `bars` (oldest first).
    ///
    /// Fewer than `trend_periods` bars never form a trend. A zero close at the
    /// start of the lookback is a data error.
    pub fn evaluate<T: OHLCV>(&self, bars: &[T]) -> Result<TrendVerdict> {
        let periods = self.config.trend_periods.get();
        if bars.len() < periods {
            return Ok(TrendVerdict::insufficient());
        }

        let lookback = &bars[bars.len() - periods..];
        let reference = &lookback[0];
        let reference_close = reference.close();
        if reference_close == 0.0 {
            tracing::warn!(
                timestamp = ?reference.timestamp(),
                "zero reference close in trend lookback"
            );
            return Err(PatternError::ZeroReferencePrice {
                timestamp: reference.timestamp(),
            });
        }

        let last_close = lookback[periods - 1].close();
        let change = (reference_close - last_close) / reference_close;
        let strength = match self.config.direction {
            TrendDirection::Down => change,
            TrendDirection::Up => -change,
        };

        let mut run = 0;
        let mut reversal_run = 0;
        let mut max_reversal_run = 0;
        for bar in lookback {
            if self.config.direction.is_with_trend(bar) {
                run += 1;
                reversal_run = 0;
            } else {
                reversal_run += 1;
                max_reversal_run = max_reversal_run.max(reversal_run);
                run = 0;
            }
        }

        let in_trend = strength >= self.config.min_trend_strength.get()
            && run >= self.config.min_consecutive
            && max_reversal_run <= self.config.max_reversal_candles;

        Ok(TrendVerdict {
            in_trend,
            strength,
            consecutive_at_end: run,
            max_reversal_run,
            lookback: periods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;
    use chrono::{DateTime, Utc};

    fn bar(open: f64, close: f64) -> Candle {
        let timestamp = DateTime::<Utc>::UNIX_EPOCH;
        Candle::new(open, open.max(close) + 0.5, open.min(close) - 0.5, close, 1000.0, timestamp)
    }

    fn bearish(closes: &[f64]) -> Vec<Candle> {
        closes.iter().map(|&c| bar(c + 1.0, c)).collect()
    }

    #[test]
    fn test_insufficient_history() {
        let tracker = TrendTracker::default();
        for n in 0..DEFAULT_TREND_PERIODS {
            let bars = bearish(&[100.0, 99.0, 98.0, 97.0][..n.min(4)]);
            let verdict = tracker.evaluate(&bars).unwrap();
            assert!(!verdict.in_trend);
            assert_eq!(verdict.strength, 0.0);
            assert_eq!(verdict.lookback, 0);
        }
    }

    #[test]
    fn test_strictly_decreasing_bearish_is_downtrend() {
        let tracker = TrendTracker::default();
        let verdict = tracker
            .evaluate(&bearish(&[100.0, 99.0, 98.0, 97.0, 96.0]))
            .unwrap();

        assert!(verdict.in_trend);
        assert!((verdict.strength - 0.04).abs() < 1e-12);
        assert_eq!(verdict.consecutive_at_end, 5);
        assert_eq!(verdict.max_reversal_run, 0);
        assert_eq!(verdict.lookback, 5);
    }

    #[test]
    fn test_only_tail_is_evaluated() {
        let tracker = TrendTracker::default();
        let mut bars = vec![bar(50.0, 200.0)];
        bars.extend(bearish(&[100.0, 99.0, 98.0, 97.0, 96.0]));
        let verdict = tracker.evaluate(&bars).unwrap();
        assert!(verdict.in_trend);
        assert!((verdict.strength - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_oscillating_closes_are_not_a_trend() {
        let tracker = TrendTracker::default();
        let verdict = tracker
            .evaluate(&bearish(&[100.0, 101.0, 99.0, 100.0, 101.0]))
            .unwrap();
        assert!(!verdict.in_trend);
        assert!(verdict.strength < 0.0);
    }

    #[test]
    fn test_bullish_bar_at_end_breaks_run() {
        let tracker = TrendTracker::default();
        let mut bars = bearish(&[100.0, 99.0, 98.0, 97.0]);
        bars.push(bar(96.0, 96.5));
        let verdict = tracker.evaluate(&bars).unwrap();
        assert!(!verdict.in_trend);
        assert_eq!(verdict.consecutive_at_end, 0);
        assert_eq!(verdict.max_reversal_run, 1);
    }

    #[test]
    fn test_short_bounce_is_tolerated() {
        let tracker = TrendTracker::default();
        // bearish, bullish bounce, three bearish
        let bars = vec![
            bar(101.0, 100.0),
            bar(100.0, 100.5),
            bar(100.5, 99.0),
            bar(99.0, 98.0),
            bar(98.0, 97.0),
        ];
        let verdict = tracker.evaluate(&bars).unwrap();
        assert!(verdict.in_trend);
        assert_eq!(verdict.consecutive_at_end, 3);
        assert_eq!(verdict.max_reversal_run, 1);
    }

    #[test]
    fn test_long_reversal_run_rejected() {
        let config = TrendConfig {
            trend_periods: Period::new(8).unwrap(),
            max_reversal_candles: 1,
            ..TrendConfig::default()
        };
        let tracker = TrendTracker::new(config);
        let bars = vec![
            bar(110.0, 109.0),
            bar(109.0, 109.5),
            bar(109.5, 110.0),
            bar(110.0, 108.0),
            bar(108.0, 106.0),
            bar(106.0, 104.0),
            bar(104.0, 102.0),
            bar(102.0, 100.0),
        ];
        let verdict = tracker.evaluate(&bars).unwrap();
        assert_eq!(verdict.max_reversal_run, 2);
        assert!(!verdict.in_trend);
    }

    #[test]
    fn test_weak_move_rejected() {
        let config = TrendConfig {
            min_trend_strength: Ratio::new(0.05).unwrap(),
            ..TrendConfig::default()
        };
        let tracker = TrendTracker::new(config);
        let verdict = tracker
            .evaluate(&bearish(&[100.0, 99.0, 98.0, 97.0, 96.0]))
            .unwrap();
        assert!(!verdict.in_trend);
    }

    #[test]
    fn test_uptrend_is_sign_reversed() {
        let config = TrendConfig {
            direction: TrendDirection::Up,
            ..TrendConfig::default()
        };
        let tracker = TrendTracker::new(config);
        let bars: Vec<Candle> = [100.0, 101.0, 102.0, 103.0, 104.0]
            .iter()
            .map(|&c| bar(c - 1.0, c))
            .collect();
        let verdict = tracker.evaluate(&bars).unwrap();
        assert!(verdict.in_trend);
        assert!((verdict.strength - 0.04).abs() < 1e-12);

        let down = TrendTracker::default().evaluate(&bars).unwrap();
        assert!(!down.in_trend);
    }

    #[test]
    fn test_zero_reference_price_is_an_error() {
        let tracker = TrendTracker::default();
        let bars = vec![
            bar(1.0, 0.0),
            bar(1.0, 0.5),
            bar(0.5, 0.4),
            bar(0.4, 0.3),
            bar(0.3, 0.2),
        ];
        let err = tracker.evaluate(&bars).unwrap_err();
        assert!(matches!(err, PatternError::ZeroReferencePrice { .. }));
    }

    #[test]
    fn test_magnitude_is_capped() {
        let verdict = TrendVerdict {
            strength: -1.7,
            ..TrendVerdict::insufficient()
        };
        assert_eq!(verdict.magnitude(), 1.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrendConfig::default().validate().is_ok());

        let zero = TrendConfig {
            min_consecutive: 0,
            ..TrendConfig::default()
        };
        assert!(zero.validate().is_err());

        let too_long = TrendConfig {
            min_consecutive: 6,
            ..TrendConfig::default()
        };
        assert!(too_long.validate().is_err());
    }
}

//! # candle-reversal
//!
//! Trend-gated candlestick reversal detection: hammer, inverted hammer and doji.
//!
//! Each detector owns a rolling window of confirmed bars. For every new bar it
//! measures the candle's shape, checks that the preceding bars form a
//! qualifying trend, and blends shape quality with trend strength into a
//! confidence score.
//!
//! ## Quick Start
//!
//! ```rust
//! use candle_reversal::prelude::*;
//! use chrono::{DateTime, Utc};
//!
//! let mut hammer = HammerDetector::with_defaults();
//! let ts = DateTime::<Utc>::UNIX_EPOCH;
//!
//! for close in [100.0, 99.0, 98.0, 97.0, 96.0] {
//!     hammer.detect(close + 1.0, close + 1.2, close - 0.2, close, 1000.0, "TSLA.US", ts)?;
//! }
//!
//! let result = hammer.detect(96.0, 96.5, 94.0, 96.3, 1000.0, "TSLA.US", ts)?;
//! assert!(result.is_detected);
//! # Ok::<(), PatternError>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trend::TrendVerdict;

pub mod detectors;
pub mod params;
pub mod shape;
pub mod trend;
pub mod window;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Parameters
        params::{get_count, get_factor, get_period, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        // Parallel
        scan_parallel,
        // Building blocks
        shape::{ShadowSide, Shape},
        trend::{TrendConfig, TrendDirection, TrendTracker, TrendVerdict},
        window::Window,
        // Engine
        BuiltinDetector,
        // Types
        Candle,
        Direction,
        EngineBuilder,
        EngineConfig,
        OHLCVExt,
        // Core traits
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternInfo,
        PatternKind,
        PatternMetadata,
        PatternResult,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        OHLCV,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur during pattern detection
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },

    /// The first close of a trend lookback is zero, so no percentage move exists.
    #[error("Zero reference close in trend lookback (bar at {timestamp:?})")]
    ZeroReferencePrice { timestamp: Option<DateTime<Utc>> },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    pub const ZERO: Ratio = Ratio(0.0);

    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Clamp a computed score into [0.0, 1.0]. NaN becomes 0.0.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Zero when the range is not positive.
    #[inline]
    fn body_ratio(&self) -> f64 {
        let range = self.range();
        if range > 0.0 {
            self.body() / range
        } else {
            0.0
        }
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        if self.open().is_nan()
            || self.high().is_nan()
            || self.low().is_nan()
            || self.close().is_nan()
            || self.volume().is_nan()
        {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.high() < self.open().max(self.close()) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "high below body",
            });
        }
        if self.low() > self.open().min(self.close()) {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "low above body",
            });
        }
        if self.volume() < 0.0 {
            return Err(PatternError::InvalidOHLCV {
                index: 0,
                reason: "negative volume",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// CANDLE
// ============================================================

/// One confirmed OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }
}

impl OHLCV for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

// ============================================================
// PATTERN RESULT
// ============================================================

/// The reversal patterns this crate detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    #[serde(rename = "Hammer")]
    Hammer,
    #[serde(rename = "Inverted Hammer")]
    InvertedHammer,
    #[serde(rename = "Doji")]
    Doji,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [
        PatternKind::Hammer,
        PatternKind::InvertedHammer,
        PatternKind::Doji,
    ];

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Hammer => "Hammer",
            PatternKind::InvertedHammer => "Inverted Hammer",
            PatternKind::Doji => "Doji",
        }
    }

    /// Direction the pattern signals once its trend gate has passed.
    pub fn typical_direction(self) -> Direction {
        match self {
            PatternKind::Hammer | PatternKind::InvertedHammer => Direction::Bullish,
            PatternKind::Doji => Direction::Neutral,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Intermediate values behind a detection decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternInfo {
    pub body: f64,
    pub total_height: f64,
    pub body_ratio: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    /// Measured shadow / body; `None` for patterns that do not use a shadow.
    pub shadow_ratio: Option<f64>,
    pub is_bullish: bool,
    /// Shape component of the confidence, 0.0 when not detected.
    pub pattern_confidence: f64,
    pub trend: TrendVerdict,
}

/// Outcome of feeding one bar to a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternResult {
    pub pattern: PatternKind,
    pub is_detected: bool,
    /// 0.0 unless detected
    pub confidence: Ratio,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub additional_info: PatternInfo,
}

impl PatternResult {
    #[inline]
    pub fn pattern_name(&self) -> &'static str {
        self.pattern.name()
    }
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Additional metadata about a pattern
#[derive(Debug, Clone)]
pub struct PatternMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub direction: Direction,
}

/// Stateful detector fed one confirmed bar at a time.
///
/// Each instance owns its window; use one instance per (symbol, timeframe).
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Push `candle` into the window and classify it against the bars before it.
    fn detect_candle(&mut self, symbol: &str, candle: Candle) -> Result<PatternResult>;

    fn window(&self) -> &window::Window;

    /// Forget all buffered bars.
    fn reset(&mut self);

    #[allow(clippy::too_many_arguments)]
    fn detect(
        &mut self,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        symbol: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<PatternResult> {
        self.detect_candle(symbol, Candle::new(open, high, low, close, volume, timestamp))
    }

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: self.kind().name(),
            description: "",
            direction: self.kind().typical_direction(),
        }
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect_candle(&mut self, symbol: &str, candle: Candle) -> Result<PatternResult> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect_candle(d, symbol, candle)),*
                }
            }

            #[inline]
            pub fn kind(&self) -> PatternKind {
                match self {
                    $(Self::$variant(d) => PatternDetector::kind(d)),*
                }
            }

            pub fn reset(&mut self) {
                match self {
                    $(Self::$variant(d) => PatternDetector::reset(d)),*
                }
            }

            pub fn window(&self) -> &window::Window {
                match self {
                    $(Self::$variant(d) => PatternDetector::window(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    Hammer(HammerDetector),
    InvertedHammer(InvertedHammerDetector),
    Doji(DojiDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub min_confidence: Option<f64>,
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternKind>>,
}

/// Set of detectors fed by a single (symbol, timeframe) bar stream
pub struct PatternEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn PatternDetector>>,
    config: EngineConfig,
    bars_seen: usize,
}

impl PatternEngine {
    /// Feed one confirmed bar to every detector.
    ///
    /// Every detector sees every bar so windows stay in step; the pattern
    /// filter and confidence floor only affect what is returned.
    pub fn on_bar(&mut self, symbol: &str, candle: Candle) -> Result<Vec<PatternResult>> {
        if self.config.validate_data {
            candle.validate().map_err(|e| match e {
                PatternError::InvalidOHLCV { reason, .. } => PatternError::InvalidOHLCV {
                    index: self.bars_seen,
                    reason,
                },
                other => other,
            })?;
        }
        self.bars_seen += 1;

        let mut results = Vec::with_capacity(self.builtin.len() + self.custom.len());
        // first failure is reported only after every detector has taken the bar
        let mut failure = None;

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &mut self.builtin {
            match detector.detect_candle(symbol, candle) {
                Ok(r) => results.push(r),
                Err(e) if failure.is_none() => failure = Some(e),
                Err(_) => {}
            }
        }

        // Slow path: custom detectors (vtable)
        for detector in &mut self.custom {
            match detector.detect_candle(symbol, candle) {
                Ok(r) => results.push(r),
                Err(e) if failure.is_none() => failure = Some(e),
                Err(_) => {}
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        results.retain(|r| self.should_include(r));
        Ok(results)
    }

    /// Like [`on_bar`](Self::on_bar) but keeps detected patterns only.
    pub fn detections(&mut self, symbol: &str, candle: Candle) -> Result<Vec<PatternResult>> {
        let mut results = self.on_bar(symbol, candle)?;
        results.retain(|r| r.is_detected);
        Ok(results)
    }

    /// Empty every detector window.
    pub fn reset(&mut self) {
        for d in &mut self.builtin {
            d.reset();
        }
        for d in &mut self.custom {
            d.reset();
        }
        self.bars_seen = 0;
    }

    /// Bars accepted since construction or the last reset.
    #[inline]
    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    pub fn detector_count(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    fn should_include(&self, r: &PatternResult) -> bool {
        if let Some(min) = self.config.min_confidence {
            if r.is_detected && r.confidence.get() < min {
                return false;
            }
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&r.pattern) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternEngine")
            .field("builtin", &self.builtin)
            .field("custom", &self.custom.len())
            .field("config", &self.config)
            .field("bars_seen", &self.bars_seen)
            .finish()
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Default)]
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn PatternDetector>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::Hammer(HammerDetector::with_defaults()),
            BuiltinDetector::InvertedHammer(InvertedHammerDetector::with_defaults()),
            BuiltinDetector::Doji(DojiDetector::with_defaults()),
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: PatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Drop detections below this confidence
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.config.min_confidence = Some(confidence);
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, kinds: impl IntoIterator<Item = PatternKind>) -> Self {
        self.config.pattern_filter = Some(kinds.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let engine = PatternEngine {
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
            bars_seen: 0,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Detections found in one instrument's bar series
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub detections: Vec<PatternResult>,
}

/// Error that stopped scanning one instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Feed several independent bar series in parallel.
///
/// Every series gets its own engine from `make_engine` and is fed in order,
/// so no detector state crosses instruments.
pub fn scan_parallel<'a, F, I>(make_engine: F, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    F: Fn() -> Result<PatternEngine> + Sync,
    I: IntoParallelIterator<Item = (&'a str, &'a [Candle])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            scan_series(&make_engine, symbol, bars)
                .map(|detections| ScanResult {
                    symbol: symbol.to_string(),
                    detections,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

fn scan_series<F>(make_engine: &F, symbol: &str, bars: &[Candle]) -> Result<Vec<PatternResult>>
where
    F: Fn() -> Result<PatternEngine>,
{
    let mut engine = make_engine()?;
    let mut detections = Vec::new();
    for bar in bars {
        detections.extend(engine.detections(symbol, *bar)?);
    }
    tracing::debug!(symbol, bars = bars.len(), detections = detections.len(), "series scanned");
    Ok(detections)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(i: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + i * 120, 0).unwrap()
    }

    fn bar(i: i64, o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::new(o, h, l, c, 1000.0, ts(i))
    }

    fn make_downtrend_bars() -> Vec<Candle> {
        [100.0, 99.0, 98.0, 97.0, 96.0]
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as i64, c + 1.0, c + 1.2, c - 0.2, c))
            .collect()
    }

    fn hammer_bar() -> Candle {
        bar(5, 96.0, 96.5, 94.0, 96.3)
    }

    #[test]
    fn test_ratio_validation() {
        assert!(Ratio::new(0.0).is_ok());
        assert!(Ratio::new(1.0).is_ok());
        assert!(Ratio::new(0.5).is_ok());
        assert!(Ratio::new(-0.1).is_err());
        assert!(Ratio::new(1.1).is_err());
        assert!(Ratio::new(f64::NAN).is_err());
        assert!(Ratio::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_ratio_saturating() {
        assert_eq!(Ratio::saturating(1.7).get(), 1.0);
        assert_eq!(Ratio::saturating(-0.2).get(), 0.0);
        assert_eq!(Ratio::saturating(f64::NAN).get(), 0.0);
        assert_eq!(Ratio::saturating(0.25).get(), 0.25);
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(1).is_ok());
        assert!(Period::new(100).is_ok());
        assert!(Period::new(0).is_err());
    }

    #[test]
    fn test_ohlcv_ext() {
        let c = bar(0, 100.0, 110.0, 90.0, 105.0);
        assert_eq!(c.body(), 5.0);
        assert_eq!(c.range(), 20.0);
        assert!(c.is_bullish());
        assert!(!c.is_bearish());
        assert!((c.body_ratio() - 0.25).abs() < 0.001);
        assert_eq!(c.timestamp(), Some(ts(0)));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        assert!(bar(0, 100.0, 110.0, 90.0, 105.0).validate().is_ok());
        assert!(bar(0, 100.0, 90.0, 110.0, 105.0).validate().is_err());
        assert!(bar(0, 100.0, 104.0, 90.0, 105.0).validate().is_err());
        assert!(bar(0, f64::NAN, 110.0, 90.0, 105.0).validate().is_err());
    }

    #[test]
    fn test_pattern_kind_names() {
        assert_eq!(PatternKind::Hammer.name(), "Hammer");
        assert_eq!(PatternKind::InvertedHammer.to_string(), "Inverted Hammer");
        assert_eq!(PatternKind::Doji.name(), "Doji");
        assert!(PatternKind::Hammer.typical_direction().is_bullish());
        assert_eq!(PatternKind::Doji.typical_direction(), Direction::Neutral);
    }

    #[test]
    fn test_engine_builder() {
        let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
        assert_eq!(engine.detector_count(), 3);
    }

    #[test]
    fn test_add_checked_rejects_bad_config() {
        let mut hammer = HammerDetector::with_defaults();
        hammer.config.shadow_ratio_threshold = 0.0;
        let result = EngineBuilder::new().add_checked(BuiltinDetector::Hammer(hammer));
        assert!(result.is_err());
    }

    #[test]
    fn test_build_validates_configs() {
        let mut doji = DojiDetector::with_defaults();
        doji.config.trend.min_consecutive = 0;
        let result = EngineBuilder::new().add(BuiltinDetector::Doji(doji)).build();
        assert!(matches!(result, Err(PatternError::InvalidConfig(_))));
    }

    #[test]
    fn test_engine_feeds_every_detector() {
        let mut engine = EngineBuilder::new().with_all_defaults().build().unwrap();

        for c in make_downtrend_bars() {
            let results = engine.on_bar("TSLA.US", c).unwrap();
            assert_eq!(results.len(), 3);
            assert!(results.iter().all(|r| !r.is_detected));
        }

        let detections = engine.detections("TSLA.US", hammer_bar()).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].pattern, PatternKind::Hammer);
        assert_eq!(detections[0].symbol, "TSLA.US");
        assert_eq!(engine.bars_seen(), 6);
    }

    #[test]
    fn test_min_confidence_filter() {
        let mut engine = EngineBuilder::new()
            .add(BuiltinDetector::Hammer(HammerDetector::with_defaults()))
            .min_confidence(0.99)
            .build()
            .unwrap();

        for c in make_downtrend_bars() {
            engine.on_bar("TSLA.US", c).unwrap();
        }
        let detections = engine.detections("TSLA.US", hammer_bar()).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_pattern_filter() {
        let mut engine = EngineBuilder::new()
            .with_all_defaults()
            .only_patterns([PatternKind::Doji])
            .build()
            .unwrap();

        for c in make_downtrend_bars() {
            let results = engine.on_bar("TSLA.US", c).unwrap();
            assert!(results.iter().all(|r| r.pattern == PatternKind::Doji));
        }
        // hammer is still fed but filtered out
        assert!(engine.detections("TSLA.US", hammer_bar()).unwrap().is_empty());
    }

    #[test]
    fn test_validate_data_reports_bar_index() {
        let mut engine = EngineBuilder::new()
            .with_all_defaults()
            .validate_data(true)
            .build()
            .unwrap();

        engine.on_bar("X", bar(0, 100.0, 101.0, 99.0, 100.5)).unwrap();
        let err = engine
            .on_bar("X", bar(1, 100.0, 99.0, 101.0, 100.5))
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidOHLCV { index: 1, .. }));
        assert_eq!(engine.bars_seen(), 1);
    }

    #[test]
    fn test_reset_empties_windows() {
        let mut engine = EngineBuilder::new().with_all_defaults().build().unwrap();
        for c in make_downtrend_bars() {
            engine.on_bar("TSLA.US", c).unwrap();
        }
        engine.reset();
        assert_eq!(engine.bars_seen(), 0);

        // no history any more, so the hammer shape alone is not enough
        assert!(engine.detections("TSLA.US", hammer_bar()).unwrap().is_empty());
    }

    #[test]
    fn test_failing_bar_still_reaches_every_detector() {
        let mut engine = EngineBuilder::new()
            .with_all_defaults()
            .add_custom(DojiDetector::with_defaults())
            .build()
            .unwrap();

        let mut bars = vec![bar(0, 0.5, 0.6, 0.0, 0.0)];
        bars.extend(make_downtrend_bars().into_iter().skip(1));
        for c in &bars {
            engine.on_bar("TSLA.US", *c).unwrap();
        }

        let err = engine.on_bar("TSLA.US", hammer_bar()).unwrap_err();
        assert!(matches!(err, PatternError::ZeroReferencePrice { .. }));

        // the zero close has left every lookback
        let results = engine.on_bar("TSLA.US", bar(6, 96.0, 96.5, 94.0, 96.3)).unwrap();
        assert_eq!(results.len(), 4);
        assert!(engine.on_bar("TSLA.US", bar(7, 96.0, 96.5, 94.0, 96.3)).is_ok());

        let lens: Vec<usize> = engine
            .builtin
            .iter()
            .map(|d| d.window().len())
            .chain(engine.custom.iter().map(|d| d.window().len()))
            .collect();
        assert_eq!(lens, vec![6, 6, 6, 6]);
        assert_eq!(engine.bars_seen(), 8);
    }

    #[test]
    fn test_custom_detector() {
        let mut engine = EngineBuilder::new()
            .add_custom(DojiDetector::with_defaults())
            .build()
            .unwrap();
        for c in make_downtrend_bars() {
            engine.on_bar("TSLA.US", c).unwrap();
        }
        let doji = bar(5, 96.0, 97.0, 95.0, 96.05);
        let detections = engine.detections("TSLA.US", doji).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].pattern_name(), "Doji");
    }

    #[test]
    fn test_parallel_scan() {
        let mut falling = make_downtrend_bars();
        falling.push(hammer_bar());
        let flat: Vec<Candle> = (0..6).map(|i| bar(i, 100.0, 101.0, 99.0, 100.5)).collect();

        let instruments: Vec<(&str, &[Candle])> = vec![("AAPL", &falling), ("GOOGL", &flat)];
        let (mut results, errors) = scan_parallel(
            || EngineBuilder::new().with_all_defaults().build(),
            instruments,
        );
        assert!(errors.is_empty());
        assert_eq!(results.len(), 2);

        results.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert_eq!(results[0].symbol, "AAPL");
        assert_eq!(results[0].detections.len(), 1);
        assert!(results[1].detections.is_empty());
    }

    #[test]
    fn test_parallel_scan_reports_errors_per_symbol() {
        let zeros: Vec<Candle> = (0..6).map(|i| bar(i, 1.0, 1.0, 0.0, 0.0)).collect();
        let good = make_downtrend_bars();

        let instruments: Vec<(&str, &[Candle])> = vec![("BAD", &zeros), ("GOOD", &good)];
        let (results, errors) = scan_parallel(
            || EngineBuilder::new().with_all_defaults().build(),
            instruments,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].symbol, "BAD");
        assert!(matches!(errors[0].error, PatternError::ZeroReferencePrice { .. }));
    }
}

//! Parameter metadata for pattern detectors
//!
//! This module provides metadata about detector parameters, enabling:
//! - Threshold sweeps over a replayed bar history
//! - Parameter documentation
//! - Building detectors from flat key/value configuration
//!
//! # Example
//!
//! ```rust
//! use candle_reversal::params::{ParamMeta, ParamType, ParameterizedDetector};
//! use candle_reversal::prelude::*;
//!
//! // Get parameter metadata for a detector
//! let params = HammerDetector::param_meta();
//! for param in params {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//! ```

use std::collections::HashMap;

use crate::trend::{
  TrendConfig, DEFAULT_MAX_REVERSAL_CANDLES, DEFAULT_MIN_CONSECUTIVE, DEFAULT_MIN_TREND_STRENGTH,
  DEFAULT_TREND_PERIODS,
};
use crate::{PatternError, PatternKind, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value within 0.0..=1.0
  Ratio,
  /// Non-negative multiplier that may exceed 1.0 (e.g. shadow / body)
  Factor,
  /// Period value (positive integer)
  Period,
  /// Bar count (non-negative integer)
  Count,
}

/// Metadata for a single detector parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "shadow_ratio_threshold")
  pub name: &'static str,
  pub param_type: ParamType,
  /// Default value
  pub default: f64,
  /// Range for sweeps: (min, max, step)
  pub range: (f64, f64, f64),
  /// Human-readable description
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn factor(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Factor, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn count(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Count, default, range, description }
  }

  /// Generate all values for a sweep
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    if step <= 0.0 {
      values.push(min);
      return values;
    }
    let mut i = 0usize;
    loop {
      // index-based to avoid accumulating float error
      let v = min + step * i as f64;
      if v > max + f64::EPSILON {
        break;
      }
      values.push(v);
      i += 1;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(PatternError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Factor => Ok(()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(PatternError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Count => {
        if value < 0.0 || value.fract() != 0.0 {
          return Err(PatternError::InvalidValue("Count must be a non-negative integer"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// TREND PARAMETERS (shared by every detector)
// ============================================================

pub const TREND_PERIODS: ParamMeta = ParamMeta::period(
  "trend_periods",
  DEFAULT_TREND_PERIODS as f64,
  (3.0, 20.0, 1.0),
  "Bars in the trend lookback",
);

pub const MIN_TREND_STRENGTH: ParamMeta = ParamMeta::ratio(
  "min_trend_strength",
  DEFAULT_MIN_TREND_STRENGTH,
  (0.0, 0.05, 0.001),
  "Minimum endpoint move over the lookback",
);

pub const MAX_REVERSAL_CANDLES: ParamMeta = ParamMeta::count(
  "max_reversal_candles",
  DEFAULT_MAX_REVERSAL_CANDLES as f64,
  (0.0, 5.0, 1.0),
  "Longest tolerated run of counter-trend bars",
);

pub const MIN_CONSECUTIVE: ParamMeta = ParamMeta::count(
  "min_consecutive",
  DEFAULT_MIN_CONSECUTIVE as f64,
  (1.0, 5.0, 1.0),
  "With-trend bars required at the end of the lookback",
);

impl TrendConfig {
  /// Trend block from flat parameters; the direction keeps its default.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let config = Self {
      trend_periods: get_period(params, "trend_periods", DEFAULT_TREND_PERIODS)?,
      min_trend_strength: get_ratio(params, "min_trend_strength", DEFAULT_MIN_TREND_STRENGTH)?,
      max_reversal_candles: get_count(params, "max_reversal_candles", DEFAULT_MAX_REVERSAL_CANDLES)?,
      min_consecutive: get_count(params, "min_consecutive", DEFAULT_MIN_CONSECUTIVE)?,
      ..Self::default()
    };
    config.validate()?;
    Ok(config)
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for detectors that support parameterization
///
/// Implementing this trait enables:
/// - Discovery of available parameters
/// - Creation of detectors with custom parameter values
/// - Threshold sweeps
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  fn pattern_kind() -> PatternKind;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  let value = params.get(key).copied().unwrap_or(default);
  Ratio::new(value)
}

/// Helper to get a non-negative finite multiplier from params with default fallback
pub fn get_factor(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  let value = params.get(key).copied().unwrap_or(default);
  if !value.is_finite() || value < 0.0 {
    return Err(PatternError::InvalidValue("Factor must be a non-negative finite number"));
  }
  Ok(value)
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a bar count from params with default fallback
pub fn get_count(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<usize> {
  let value = params.get(key).copied().unwrap_or(default as f64);
  if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
    return Err(PatternError::InvalidValue("Count must be a non-negative integer"));
  }
  Ok(value as usize)
}

// ============================================================
// TESTS
// ============================================================

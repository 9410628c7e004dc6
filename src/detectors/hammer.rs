//! Hammer: small bullish body, long lower shadow, after a downtrend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{self, admits_hammer_shape, finish, ingest, shadow_pattern_confidence};
use crate::params::{self, get_factor, get_ratio, ParamMeta, ParameterizedDetector};
use crate::shape::ShadowSide;
use crate::trend::TrendConfig;
use crate::window::Window;
use crate::{Candle, PatternDetector, PatternKind, PatternMetadata, PatternResult, Ratio, Result};

/// Thresholds for the hammer family.
///
/// Shared by [`HammerDetector`] (long lower shadow) and
/// [`InvertedHammerDetector`](super::InvertedHammerDetector) (long upper shadow).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HammerConfig {
    /// Maximum body / range.
    pub body_ratio_threshold: Ratio,
    /// Minimum long-shadow / body.
    pub shadow_ratio_threshold: f64,
    /// Opposite shadow may be at most `body * opposite_shadow_factor`.
    pub opposite_shadow_factor: f64,
    pub trend: TrendConfig,
}

impl Default for HammerConfig {
    fn default() -> Self {
        Self {
            body_ratio_threshold: Ratio::new_const(helpers::HAMMER_BODY_RATIO),
            shadow_ratio_threshold: helpers::HAMMER_SHADOW_RATIO,
            opposite_shadow_factor: helpers::OPPOSITE_SHADOW_FACTOR,
            trend: TrendConfig::default(),
        }
    }
}

impl HammerConfig {
    pub fn validate(&self) -> Result<()> {
        helpers::positive_threshold("body_ratio_threshold", self.body_ratio_threshold.get())?;
        helpers::positive_threshold("shadow_ratio_threshold", self.shadow_ratio_threshold)?;
        if !self.opposite_shadow_factor.is_finite() || self.opposite_shadow_factor < 0.0 {
            return Err(crate::PatternError::InvalidConfig(format!(
                "opposite_shadow_factor must be a non-negative finite number, got {}",
                self.opposite_shadow_factor
            )));
        }
        self.trend.validate()
    }

    /// Shape and trend admission plus the shape confidence when admitted.
    pub(crate) fn evaluate(
        &self,
        side: ShadowSide,
        shape: &crate::shape::Shape,
        in_trend: bool,
    ) -> Option<f64> {
        let admitted = in_trend
            && admits_hammer_shape(
                shape,
                side,
                self.body_ratio_threshold.get(),
                self.shadow_ratio_threshold,
                self.opposite_shadow_factor,
            );
        admitted.then(|| {
            shadow_pattern_confidence(
                shape.shadow_ratio(side),
                self.shadow_ratio_threshold,
                shape.body_ratio,
                self.body_ratio_threshold.get(),
            )
        })
    }
}

/// Hammer reversal after a downtrend
#[derive(Debug, Clone)]
pub struct HammerDetector {
    pub config: HammerConfig,
    window: Window,
}

impl Default for HammerDetector {
    fn default() -> Self {
        let config = HammerConfig::default();
        Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        }
    }
}

impl HammerDetector {
    pub fn new(config: HammerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        })
    }
}

impl PatternDetector for HammerDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Hammer
    }

    fn detect_candle(&mut self, symbol: &str, candle: Candle) -> Result<PatternResult> {
        let kind = self.kind();
        let (shape, trend) = ingest(&mut self.window, &self.config.trend, kind, symbol, candle)?;
        let side = ShadowSide::Lower;
        let pattern_confidence = self.config.evaluate(side, &shape, trend.in_trend);

        Ok(finish(
            kind,
            symbol,
            &candle,
            shape,
            Some(shape.shadow_ratio(side)),
            trend,
            pattern_confidence,
        ))
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn reset(&mut self) {
        self.window.clear();
    }

    fn validate_config(&self) -> Result<()> {
        self.config.validate()
    }

    fn metadata(&self) -> PatternMetadata {
        PatternMetadata {
            name: self.kind().name(),
            description: "Small bullish body with a long lower shadow after a downtrend",
            direction: helpers::reversal_direction(self.kind(), self.config.trend.direction),
        }
    }
}

// ============================================================
// PARAMETERS
// ============================================================

const BODY_RATIO_THRESHOLD: ParamMeta = ParamMeta::ratio(
    "body_ratio_threshold",
    helpers::HAMMER_BODY_RATIO,
    (0.1, 0.5, 0.05),
    "Maximum body to range ratio",
);

const SHADOW_RATIO_THRESHOLD: ParamMeta = ParamMeta::factor(
    "shadow_ratio_threshold",
    helpers::HAMMER_SHADOW_RATIO,
    (1.0, 4.0, 0.5),
    "Minimum long shadow to body ratio",
);

const OPPOSITE_SHADOW: ParamMeta = ParamMeta::factor(
    "opposite_shadow_factor",
    helpers::OPPOSITE_SHADOW_FACTOR,
    (0.0, 2.0, 0.1),
    "Maximum opposite shadow as a multiple of the body",
);

static HAMMER_PARAMS: &[ParamMeta] = &[
    BODY_RATIO_THRESHOLD,
    SHADOW_RATIO_THRESHOLD,
    OPPOSITE_SHADOW,
    params::TREND_PERIODS,
    params::MIN_TREND_STRENGTH,
    params::MAX_REVERSAL_CANDLES,
    params::MIN_CONSECUTIVE,
];

impl HammerConfig {
    pub(crate) fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    pub(crate) fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let config = Self {
            body_ratio_threshold: get_ratio(params, "body_ratio_threshold", helpers::HAMMER_BODY_RATIO)?,
            shadow_ratio_threshold: get_factor(
                params,
                "shadow_ratio_threshold",
                helpers::HAMMER_SHADOW_RATIO,
            )?,
            opposite_shadow_factor: get_factor(
                params,
                "opposite_shadow_factor",
                helpers::OPPOSITE_SHADOW_FACTOR,
            )?,
            trend: TrendConfig::with_params(params)?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ParameterizedDetector for HammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HammerConfig::param_meta()
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Self::new(HammerConfig::with_params(params)?)
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::Hammer
    }
}

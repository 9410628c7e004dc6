//! Doji: near-zero body relative to range, after a downtrend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{self, doji_pattern_confidence, finish, ingest};
use crate::params::{self, get_ratio, ParamMeta, ParameterizedDetector};
use crate::trend::TrendConfig;
use crate::window::Window;
use crate::{Candle, PatternDetector, PatternKind, PatternMetadata, PatternResult, Ratio, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DojiConfig {
    /// Maximum body / range.
    pub body_ratio_threshold: Ratio,
    pub trend: TrendConfig,
}

impl Default for DojiConfig {
    fn default() -> Self {
        Self {
            body_ratio_threshold: Ratio::new_const(helpers::DOJI_BODY_RATIO),
            trend: TrendConfig::default(),
        }
    }
}

impl DojiConfig {
    pub fn validate(&self) -> Result<()> {
        helpers::positive_threshold("body_ratio_threshold", self.body_ratio_threshold.get())?;
        self.trend.validate()
    }
}

/// Doji after a downtrend
#[derive(Debug, Clone)]
pub struct DojiDetector {
    pub config: DojiConfig,
    window: Window,
}

impl Default for DojiDetector {
    fn default() -> Self {
        let config = DojiConfig::default();
        Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        }
    }
}

impl DojiDetector {
    pub fn new(config: DojiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        })
    }
}

impl PatternDetector for DojiDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Doji
    }

    fn detect_candle(&mut self, symbol: &str, candle: Candle) -> Result<PatternResult> {
        let kind = self.kind();
        let (shape, trend) = ingest(&mut self.window, &self.config.trend, kind, symbol, candle)?;
        let threshold = self.config.body_ratio_threshold.get();

        // a flat bar has body_ratio 0 but is not a doji
        let admitted = shape.has_height() && shape.body_ratio <= threshold && trend.in_trend;
        let pattern_confidence = admitted.then(|| doji_pattern_confidence(shape.body_ratio, threshold));

        Ok(finish(kind, symbol, &candle, shape, None, trend, pattern_confidence))
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
            description: "Open and close nearly equal after a downtrend",
            direction: self.kind().typical_direction(),
        }
    }
}

static DOJI_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio(
        "body_ratio_threshold",
        helpers::DOJI_BODY_RATIO,
        (0.02, 0.2, 0.02),
        "Maximum body to range ratio",
    ),
    params::TREND_PERIODS,
    params::MIN_TREND_STRENGTH,
    params::MAX_REVERSAL_CANDLES,
    params::MIN_CONSECUTIVE,
];

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Self::new(DojiConfig {
            body_ratio_threshold: get_ratio(params, "body_ratio_threshold", helpers::DOJI_BODY_RATIO)?,
            trend: TrendConfig::with_params(params)?,
        })
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::Doji
    }
}

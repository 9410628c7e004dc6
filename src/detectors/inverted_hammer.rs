//! Inverted hammer: small bullish body, long upper shadow, after a downtrend.

use std::collections::HashMap;

use super::hammer::HammerConfig;
use super::helpers::{self, finish, ingest};
use crate::params::{ParamMeta, ParameterizedDetector};
use crate::shape::ShadowSide;
use crate::window::Window;
use crate::{Candle, PatternDetector, PatternKind, PatternMetadata, PatternResult, Result};

/// Same thresholds as the hammer, measured on the upper shadow.
pub type InvertedHammerConfig = HammerConfig;

/// Inverted hammer reversal after a downtrend
#[derive(Debug, Clone)]
pub struct InvertedHammerDetector {
    pub config: InvertedHammerConfig,
    window: Window,
}

impl Default for InvertedHammerDetector {
    fn default() -> Self {
        let config = InvertedHammerConfig::default();
        Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        }
    }
}

impl InvertedHammerDetector {
    pub fn new(config: InvertedHammerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: Window::for_trend(config.trend.trend_periods),
            config,
        })
    }
}

impl PatternDetector for InvertedHammerDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::InvertedHammer
    }

    fn detect_candle(&mut self, symbol: &str, candle: Candle) -> Result<PatternResult> {
        let kind = self.kind();
        let (shape, trend) = ingest(&mut self.window, &self.config.trend, kind, symbol, candle)?;
        let side = ShadowSide::Upper;
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
            description: "Small bullish body with a long upper shadow after a downtrend",
            direction: helpers::reversal_direction(self.kind(), self.config.trend.direction),
        }
    }
}

impl ParameterizedDetector for InvertedHammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        InvertedHammerConfig::param_meta()
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Self::new(InvertedHammerConfig::with_params(params)?)
    }

    fn pattern_kind() -> PatternKind {
        PatternKind::InvertedHammer
    }
}

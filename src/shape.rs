//! Single-candle geometry used by the admission rules.

use serde::{Deserialize, Serialize};

use crate::{OHLCVExt, OHLCV};

/// Which wick a hammer-family pattern measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowSide {
    Upper,
    Lower,
}

impl ShadowSide {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            ShadowSide::Upper => ShadowSide::Lower,
            ShadowSide::Lower => ShadowSide::Upper,
        }
    }
}

/// Body and shadow measurements of one candle.
///
/// Ratios resolve to `0.0` when their denominator is zero, so a flat or
/// bodiless candle simply fails every ratio threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub body: f64,
    pub total_height: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    pub body_ratio: f64,
    pub is_bullish: bool,
}

impl Shape {
    pub fn of<T: OHLCV>(bar: &T) -> Self {
        Self {
            body: bar.body(),
            total_height: bar.range(),
            upper_shadow: bar.upper_shadow(),
            lower_shadow: bar.lower_shadow(),
            body_ratio: bar.body_ratio(),
            is_bullish: bar.is_bullish(),
        }
    }

    #[inline]
    pub fn shadow(&self, side: ShadowSide) -> f64 {
        match side {
            ShadowSide::Upper => self.upper_shadow,
            ShadowSide::Lower => self.lower_shadow,
        }
    }

    /// Shadow length in multiples of the body.
    #[inline]
    pub fn shadow_ratio(&self, side: ShadowSide) -> f64 {
        if self.body > 0.0 {
            self.shadow(side) / self.body
        } else {
            0.0
        }
    }

    #[inline]
    pub fn has_height(&self) -> bool {
        self.total_height > 0.0
    }
}

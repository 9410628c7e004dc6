//! Trend-gated reversal detectors
//!
//! Every detector owns a [`Window`](crate::window::Window) of recent bars and
//! classifies each new bar against the trend formed by the bars before it.
//!
//! - **Hammer**: long lower shadow, small bullish body
//! - **Inverted Hammer**: long upper shadow, small bullish body
//! - **Doji**: body negligible relative to range

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod doji;
pub mod hammer;
pub mod inverted_hammer;

impl_with_defaults!(HammerDetector, InvertedHammerDetector, DojiDetector);

// Re-export all detectors for convenience
pub use doji::*;
pub use hammer::*;
pub use helpers::*;
pub use inverted_hammer::*;

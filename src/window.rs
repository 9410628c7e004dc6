//! Rolling bar window owned by a single detector.

use std::collections::VecDeque;

use crate::{Candle, Period};

/// Fixed-capacity FIFO of the most recent `trend_periods + 1` candles, oldest first.
///
/// The buffer is kept contiguous after every push so the whole window can be
/// handed out as a slice.
#[derive(Debug, Clone)]
pub struct Window {
    bars: VecDeque<Candle>,
    capacity: usize,
}

impl Window {
    /// Window sized for a trend lookback: holds `trend_periods + 1` bars.
    pub fn for_trend(trend_periods: Period) -> Self {
        Self::with_capacity(trend_periods.get() + 1)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            bars: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a bar, evicting the oldest once capacity is exceeded.
    pub fn push(&mut self, candle: Candle) {
        self.bars.push_back(candle);
        while self.bars.len() > self.capacity {
            self.bars.pop_front();
        }
        self.bars.make_contiguous();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.bars.len() == self.capacity
    }

    /// Most recently pushed bar.
    #[inline]
    pub fn latest(&self) -> Option<&Candle> {
        self.bars.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Candle> + ExactSizeIterator {
        self.bars.iter()
    }

    /// All buffered bars, oldest first.
    #[inline]
    pub fn as_slice(&self) -> &[Candle] {
        // contiguous since `push`
        self.bars.as_slices().0
    }

    /// Buffered bars preceding the newest one.
    pub fn history(&self) -> &[Candle] {
        let bars = self.as_slice();
        match bars.len() {
            0 => bars,
            n => &bars[..n - 1],
        }
    }

    /// Resize the window, dropping the oldest bars if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.bars.len() > self.capacity {
            self.bars.pop_front();
        }
        self.bars.make_contiguous();
    }

    pub fn clear(&mut self) {
        self.bars.clear();
    }
}

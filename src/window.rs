use crate::Price;
use std::collections::VecDeque;

/// Fixed-size sliding window over scalar values with a running sum.
///
/// With `SUM_OF_SQUARES` enabled the window also tracks the running sum of
/// squares, which is all Bollinger Bands needs for a population variance.
#[derive(Clone, Debug)]
pub(crate) struct RollingSum<const SUM_OF_SQUARES: bool = false> {
    size: usize,
    window: VecDeque<Price>,
    /// Maintained incrementally via add/subtract, may accumulate FP rounding
    /// drift over very long runs, negligible for typical window sizes.
    sum: Price,
    sum_of_squares: f64,
}

pub(crate) type RollingSumOfSquares = RollingSum<true>;

impl<const SUM_OF_SQUARES: bool> RollingSum<SUM_OF_SQUARES> {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            window: VecDeque::with_capacity(size),
            sum: 0.0,
            sum_of_squares: 0.0,
        }
    }

    #[inline]
    pub fn push(&mut self, value: Price) {
        if self.is_ready()
            && let Some(old) = self.window.pop_front()
        {
            self.sum -= old;
            if SUM_OF_SQUARES {
                self.sum_of_squares -= old * old;
            }
        }

        self.window.push_back(value);
        self.sum += value;
        if SUM_OF_SQUARES {
            self.sum_of_squares += value * value;
        }
    }

    #[inline]
    pub fn sum(&self) -> Option<Price> {
        self.is_ready().then_some(self.sum)
    }

    #[inline]
    pub fn sum_of_squares(&self) -> Option<f64> {
        assert!(SUM_OF_SQUARES, "sum_of_squares requires RollingSum<true>");
        self.is_ready().then_some(self.sum_of_squares)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.window.len() == self.size
    }
}

/// Highest high and lowest low over the last `size` bars.
///
/// Monotonic deques keep each update O(1) amortized: every value is pushed
/// and popped at most once.
#[derive(Clone, Debug)]
pub(crate) struct RollingExtremes {
    size: usize,
    seen: usize,
    highs: VecDeque<(usize, Price)>,
    lows: VecDeque<(usize, Price)>,
}

impl RollingExtremes {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            seen: 0,
            highs: VecDeque::with_capacity(size),
            lows: VecDeque::with_capacity(size),
        }
    }

    #[inline]
    pub fn push(&mut self, high: Price, low: Price) {
        let index = self.seen;
        self.seen += 1;

        while self.highs.back().is_some_and(|&(_, h)| h <= high) {
            self.highs.pop_back();
        }
        self.highs.push_back((index, high));

        while self.lows.back().is_some_and(|&(_, l)| l >= low) {
            self.lows.pop_back();
        }
        self.lows.push_back((index, low));

        // Oldest index still inside the window.
        let start = self.seen.saturating_sub(self.size);
        while self.highs.front().is_some_and(|&(i, _)| i < start) {
            self.highs.pop_front();
        }
        while self.lows.front().is_some_and(|&(i, _)| i < start) {
            self.lows.pop_front();
        }
    }

    /// `(highest, lowest)` once the window is full.
    #[inline]
    pub fn range(&self) -> Option<(Price, Price)> {
        if self.seen < self.size {
            return None;
        }

        Some((self.highs.front()?.1, self.lows.front()?.1))
    }
}

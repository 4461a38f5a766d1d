use crate::Ohlcv;

use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its validated
/// parameters. Configs are value types: cheap to copy, compare, and hash.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Eq + Hash + Display + Debug {
    /// Number of bars needed before the first value is produced.
    ///
    /// A value of `1` means the indicator is defined from the first bar.
    fn warm_up(&self) -> usize;
}

/// A streaming technical indicator.
///
/// Indicators maintain internal state and update incrementally on each call to
/// [`compute`](Indicator::compute), one call per appended bar. Output is
/// `None` until enough history has been received, and wherever the indicator
/// documents a degenerate divisor as absence.
///
/// # Example
///
/// ```
/// use chartlab_ta::{Bar, Indicator, Sma, SmaConfig};
/// use std::num::NonZero;
///
/// let mut sma = Sma::new(SmaConfig::close(NonZero::new(3).unwrap()));
///
/// let bar = |close, t| Bar::new(t, close, close, close, close, 0).unwrap();
/// assert_eq!(sma.compute(&bar(10.0, 1)), None);
/// assert_eq!(sma.compute(&bar(20.0, 2)), None);
/// assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type. `f64` for simple indicators,
    /// a struct for composite ones (e.g. Bollinger Bands).
    type Output: Copy + Send + Sync + Display + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// Feeds the next bar and returns the updated value, or `None` if the
    /// value is not defined at this bar.
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output>;

    /// Returns the last computed value without advancing state.
    ///
    /// This is a cached field read: O(1) with no computation.
    fn value(&self) -> Option<Self::Output>;
}

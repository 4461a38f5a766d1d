use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use serde::Serialize;

use crate::{
    Error, Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, Result,
    window::RollingSumOfSquares,
};

/// Standard deviation multiplier for Bollinger Bands.
///
/// Wraps a positive, finite `f64`. Defaults to `2.0` (the standard Bollinger
/// Bands setting).
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct StdDev(f64);

impl StdDev {
    /// Creates a new standard deviation multiplier.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `value` is zero, negative, NaN or
    /// infinite.
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::invalid(
                "Bollinger Bands",
                format!("multiplier must be positive and finite, got {value}"),
            ));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for StdDev {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for StdDev {}

impl Hash for StdDev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for StdDev {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Configuration for the Bollinger Bands ([`Bb`]) indicator.
///
/// # Example
///
/// ```
/// use chartlab_ta::{BbConfig, IndicatorConfig, StdDev};
/// use std::num::NonZero;
///
/// let config = BbConfig::new(NonZero::new(20).unwrap(), StdDev::new(2.5).unwrap());
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.warm_up(), 20);
/// assert_eq!(BbConfig::default().std_dev().value(), 2.0);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct BbConfig {
    length: usize,
    std_dev: StdDev,
}

impl IndicatorConfig for BbConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        self.length
    }
}

impl BbConfig {
    #[must_use]
    pub fn builder() -> BbConfigBuilder {
        BbConfigBuilder::default()
    }

    #[must_use]
    pub fn new(length: NonZero<usize>, std_dev: StdDev) -> Self {
        Self {
            length: length.get(),
            std_dev,
        }
    }

    /// BB with custom length, close price, 2σ.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, StdDev::default())
    }

    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Standard deviation multiplier for the upper and lower bands.
    #[inline]
    #[must_use]
    pub fn std_dev(&self) -> StdDev {
        self.std_dev
    }
}

impl Default for BbConfig {
    /// BB(20, Close, 2σ).
    fn default() -> Self {
        Self {
            length: 20,
            std_dev: StdDev::default(),
        }
    }
}

impl Display for BbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BbConfig({}, {})", self.length, self.std_dev.value())
    }
}

/// Builder for [`BbConfig`].
///
/// Defaults: length = 20, `std_dev` = `2.0`.
#[derive(Default)]
pub struct BbConfigBuilder {
    length: Option<NonZero<usize>>,
    std_dev: Option<f64>,
}

impl BbConfigBuilder {
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn std_dev(mut self, std_dev: f64) -> Self {
        self.std_dev = Some(std_dev);
        self
    }

    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if the multiplier is not positive and
    /// finite.
    pub fn build(self) -> Result<BbConfig> {
        let std_dev = self.std_dev.map_or(Ok(StdDev::default()), StdDev::new)?;
        Ok(BbConfig {
            length: self.length.map_or(BbConfig::default().length, NonZero::get),
            std_dev,
        })
    }
}

/// Bollinger Bands output: upper, middle, and lower bands.
///
/// ```text
/// upper  = SMA + k × σ
/// middle = SMA
/// lower  = SMA − k × σ
/// ```
///
/// `upper >= middle >= lower` holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BbValue {
    upper: Price,
    middle: Price,
    lower: Price,
}

impl BbValue {
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Price {
        self.upper
    }

    #[inline]
    #[must_use]
    pub fn middle(&self) -> Price {
        self.middle
    }

    #[inline]
    #[must_use]
    pub fn lower(&self) -> Price {
        self.lower
    }

    /// Band width: `upper − lower`. Zero on a flat window.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub(crate) fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            upper: f(self.upper),
            middle: f(self.middle),
            lower: f(self.lower),
        }
    }
}

impl Display for BbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB(u: {}, m: {}, l: {})",
            self.upper, self.middle, self.lower
        )
    }
}

/// Bollinger Bands (BB).
///
/// A simple moving average of closes (middle) with upper and lower bands
/// offset by a multiple of the window's population standard deviation.
///
/// Uses a running sum and sum of squares for O(1) updates per bar. Variance
/// is clamped at zero, so a flat window collapses all three bands onto the
/// middle instead of producing NaN.
#[derive(Clone, Debug)]
pub struct Bb {
    config: BbConfig,
    length_reciprocal: f64,
    window: RollingSumOfSquares,
    current: Option<BbValue>,
}

impl Indicator for Bb {
    type Config = BbConfig;
    type Output = BbValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            #[allow(clippy::cast_precision_loss)]
            length_reciprocal: 1.0 / config.length as f64,
            window: RollingSumOfSquares::new(config.length),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window.push(PriceSource::Close.extract(ohlcv, None));

        self.current = match (self.window.sum(), self.window.sum_of_squares()) {
            (Some(sum), Some(sum_of_squares)) => {
                let mean = sum * self.length_reciprocal;

                // Variance = E[X^2] - (E[X])^2
                let variance = sum_of_squares.mul_add(self.length_reciprocal, -(mean * mean));
                let offset = variance.max(0.0).sqrt() * self.config.std_dev.value();

                Some(BbValue {
                    upper: mean + offset,
                    middle: mean,
                    lower: mean - offset,
                })
            }
            _ => None,
        };

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({}, {})",
            self.config.length,
            self.config.std_dev.value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{bar, nz};

    fn bb(length: usize) -> Bb {
        Bb::new(BbConfig::close(nz(length)))
    }

    fn bb_with_std_dev(length: usize, std_dev: f64) -> Bb {
        Bb::new(BbConfig::new(nz(length), StdDev::new(std_dev).unwrap()))
    }

    fn assert_bb(value: Option<BbValue>, upper: f64, middle: f64, lower: f64) {
        let v = value.expect("expected Some(BbValue)");
        assert!(
            (v.upper() - upper).abs() < 1e-10,
            "upper: expected {upper}, got {}",
            v.upper()
        );
        assert!(
            (v.middle() - middle).abs() < 1e-10,
            "middle: expected {middle}, got {}",
            v.middle()
        );
        assert!(
            (v.lower() - lower).abs() < 1e-10,
            "lower: expected {lower}, got {}",
            v.lower()
        );
    }

    mod filling {
        use super::*;

        #[test]
        fn none_until_window_full() {
            let mut bb = bb(3);
            assert!(bb.compute(&bar(10.0, 1)).is_none());
            assert!(bb.compute(&bar(20.0, 2)).is_none());
            assert!(bb.compute(&bar(30.0, 3)).is_some());
        }
    }

    mod computation {
        use super::*;

        #[test]
        fn basic_bands() {
            // window [3, 5]: mean=4, variance=1, σ=1 → (6, 4, 2)
            let mut bb = bb(2);
            bb.compute(&bar(3.0, 1));
            assert_bb(bb.compute(&bar(5.0, 2)), 6.0, 4.0, 2.0);
        }

        #[test]
        fn constant_input_collapses_to_middle() {
            let mut bb = bb(3);
            bb.compute(&bar(10.0, 1));
            bb.compute(&bar(10.0, 2));
            let v = bb.compute(&bar(10.0, 3));
            assert_bb(v, 10.0, 10.0, 10.0);
            assert!(v.unwrap().width().abs() < 1e-10);
        }

        #[test]
        fn slides_on_advance() {
            // [5, 7]: mean=6, σ=1 → (8, 6, 4)
            let mut bb = bb(2);
            bb.compute(&bar(3.0, 1));
            bb.compute(&bar(5.0, 2));
            assert_bb(bb.compute(&bar(7.0, 3)), 8.0, 6.0, 4.0);
        }

        #[test]
        fn fractional_multiplier() {
            // [3, 5], k=1.5 → (5.5, 4, 2.5)
            let mut bb = bb_with_std_dev(2, 1.5);
            bb.compute(&bar(3.0, 1));
            assert_bb(bb.compute(&bar(5.0, 2)), 5.5, 4.0, 2.5);
        }

        #[test]
        fn bands_stay_ordered() {
            let mut bb = bb(4);
            for (t, close) in (1..).zip([10.0, 10.5, 9.8, 11.2, 10.9, 10.1, 12.3, 11.7]) {
                if let Some(v) = bb.compute(&bar(close, t)) {
                    assert!(v.upper() >= v.middle() && v.middle() >= v.lower());
                }
            }
        }
    }

    mod std_dev {
        use super::*;

        #[test]
        fn rejects_non_positive_or_nan() {
            assert!(StdDev::new(0.0).is_err());
            assert!(StdDev::new(-1.0).is_err());
            assert!(StdDev::new(f64::NAN).is_err());
            assert!(StdDev::new(f64::INFINITY).is_err());
        }

        #[test]
        fn equal_bits_hash_equal() {
            use std::collections::HashSet;

            let mut set = HashSet::new();
            set.insert(BbConfig::default());
            assert!(set.contains(&BbConfig::close(nz(20))));
            assert!(!set.contains(&BbConfig::new(nz(20), StdDev::new(2.5).unwrap())));
        }
    }

    mod builder {
        use super::*;

        #[test]
        fn fills_defaults() {
            let config = BbConfig::builder().std_dev(1.5).build().unwrap();
            assert_eq!(config.length(), 20);
            assert_eq!(config.std_dev(), StdDev::new(1.5).unwrap());
            assert_eq!(BbConfig::builder().build().unwrap(), BbConfig::default());
        }

        #[test]
        fn rejects_bad_multiplier() {
            assert!(BbConfig::builder().std_dev(0.0).build().is_err());
            assert!(BbConfig::builder().length(nz(10)).std_dev(f64::NAN).build().is_err());
        }
    }

    mod display {
        use super::*;

        #[test]
        fn formats_correctly() {
            assert_eq!(bb(20).to_string(), "BB(20, 2)");
            assert_eq!(BbConfig::default().to_string(), "BbConfig(20, 2)");
        }
    }
}

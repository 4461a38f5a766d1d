use std::{fmt::Display, num::NonZero};

use serde::Serialize;

use crate::{Indicator, IndicatorConfig, Ohlcv, Sma, SmaConfig, window::RollingExtremes};

const DEFAULT_K_LENGTH: NonZero<usize> = NonZero::new(14).unwrap();
const DEFAULT_D_LENGTH: NonZero<usize> = NonZero::new(3).unwrap();

/// Configuration for the Stochastic Oscillator ([`Stoch`]).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct StochConfig {
    k_length: NonZero<usize>,
    d_length: NonZero<usize>,
}

impl IndicatorConfig for StochConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        self.k_length.get() + self.d_length.get() - 1
    }
}

impl StochConfig {
    #[must_use]
    pub fn new(k_length: NonZero<usize>, d_length: NonZero<usize>) -> Self {
        Self { k_length, d_length }
    }

    /// Lookback of the highest-high / lowest-low range.
    #[inline]
    #[must_use]
    pub fn k_length(&self) -> usize {
        self.k_length.get()
    }

    /// Length of the %D moving average over %K.
    #[inline]
    #[must_use]
    pub fn d_length(&self) -> usize {
        self.d_length.get()
    }
}

impl Default for StochConfig {
    /// Stochastic(14, 3).
    fn default() -> Self {
        Self {
            k_length: DEFAULT_K_LENGTH,
            d_length: DEFAULT_D_LENGTH,
        }
    }
}

impl Display for StochConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StochConfig({}, {})", self.k_length, self.d_length)
    }
}

/// Stochastic output: `%K` and its moving average `%D`, both in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochValue {
    k: f64,
    d: f64,
}

impl StochValue {
    #[inline]
    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    #[inline]
    #[must_use]
    pub fn d(&self) -> f64 {
        self.d
    }

    pub(crate) fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            k: f(self.k),
            d: f(self.d),
        }
    }
}

impl Display for StochValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stoch(k: {}, d: {})", self.k, self.d)
    }
}

/// Stochastic Oscillator.
///
/// ```text
/// %K = 100 × (close − lowest_low) / (highest_high − lowest_low)
/// %D = SMA(d_length) of %K
/// ```
///
/// Emits only once `%D` is defined. A flat range clamps `%K` to `50`.
#[derive(Clone, Debug)]
pub struct Stoch {
    config: StochConfig,
    extremes: RollingExtremes,
    d: Sma,
    current: Option<StochValue>,
}

impl Indicator for Stoch {
    type Config = StochConfig;
    type Output = StochValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            extremes: RollingExtremes::new(config.k_length.get()),
            d: Sma::new(SmaConfig::close(config.d_length)),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.extremes.push(ohlcv.high(), ohlcv.low());

        self.current = self.extremes.range().and_then(|(highest, lowest)| {
            let range = highest - lowest;
            let k = if range == 0.0 {
                50.0
            } else {
                100.0 * (ohlcv.close() - lowest) / range
            };
            self.d.update(k).map(|d| StochValue { k, d })
        });

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Display for Stoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stoch({}, {})", self.config.k_length, self.config.d_length)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_near, nz, ohlc};

    fn stoch(k: usize, d: usize) -> Stoch {
        Stoch::new(StochConfig::new(nz(k), nz(d)))
    }

    #[test]
    fn emits_once_d_is_defined() {
        let mut stoch = stoch(3, 2);
        let bars = [
            ohlc(10.0, 11.0, 9.0, 10.0, 1),
            ohlc(10.0, 12.0, 10.0, 11.0, 2),
            ohlc(11.0, 13.0, 10.0, 12.0, 3),
            ohlc(12.0, 14.0, 11.0, 13.0, 4),
        ];
        let out: Vec<_> = bars.iter().map(|b| stoch.compute(b)).collect();
        assert_eq!(&out[..3], &[None, None, None]);

        // bar 3: range [9, 13], close 12 → 75; bar 4: range [10, 14], close 13 → 75
        let v = out[3].unwrap();
        assert_near!(v.k(), 75.0, 1e-12);
        assert_near!(v.d(), 75.0, 1e-12);
        assert_eq!(StochConfig::new(nz(3), nz(2)).warm_up(), 4);
    }

    #[test]
    fn close_at_extremes() {
        let mut stoch = stoch(2, 1);
        stoch.compute(&ohlc(10.0, 12.0, 8.0, 9.0, 1));
        let top = stoch.compute(&ohlc(11.0, 13.0, 10.0, 13.0, 2)).unwrap();
        assert_eq!(top.k(), 100.0);
        let bottom = stoch.compute(&ohlc(11.0, 12.0, 9.0, 9.0, 3)).unwrap();
        assert_eq!(bottom.k(), 0.0);
    }

    #[test]
    fn flat_range_is_midpoint() {
        let mut stoch = stoch(3, 3);
        for t in 1..=6 {
            stoch.compute(&ohlc(7.0, 7.0, 7.0, 7.0, t));
        }
        assert_eq!(stoch.value().map(|v| (v.k(), v.d())), Some((50.0, 50.0)));
    }

    #[test]
    fn default_is_14_3() {
        let config = StochConfig::default();
        assert_eq!((config.k_length(), config.d_length()), (14, 3));
        assert_eq!(config.to_string(), "StochConfig(14, 3)");
    }
}

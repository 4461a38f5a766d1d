use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, window::RollingExtremes};

/// Configuration for [`WilliamsR`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct WilliamsRConfig {
    length: usize,
}

impl IndicatorConfig for WilliamsRConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        self.length
    }
}

impl WilliamsRConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }

    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for WilliamsRConfig {
    /// Williams %R(14).
    fn default() -> Self {
        Self { length: 14 }
    }
}

impl Display for WilliamsRConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WilliamsRConfig({})", self.length)
    }
}

/// Williams %R, in `[-100, 0]`.
///
/// ```text
/// %R = −100 × (highest_high − close) / (highest_high − lowest_low)
/// ```
///
/// A flat range gives `-50`.
#[derive(Clone, Debug)]
pub struct WilliamsR {
    config: WilliamsRConfig,
    extremes: RollingExtremes,
    current: Option<f64>,
}

impl Indicator for WilliamsR {
    type Config = WilliamsRConfig;
    type Output = f64;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            extremes: RollingExtremes::new(config.length),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<f64> {
        self.extremes.push(ohlcv.high(), ohlcv.low());

        self.current = self.extremes.range().map(|(highest, lowest)| {
            let range = highest - lowest;
            if range == 0.0 {
                -50.0
            } else {
                -100.0 * (highest - ohlcv.close()) / range
            }
        });

        self.current
    }

    #[inline]
    fn value(&self) -> Option<f64> {
        self.current
    }
}

impl Display for WilliamsR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "W%R({})", self.config.length)
    }
}

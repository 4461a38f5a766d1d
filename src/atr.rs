use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource};

/// Configuration for the Average True Range ([`Atr`]) indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct AtrConfig {
    length: usize,
}

impl IndicatorConfig for AtrConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        self.length + 1
    }
}

impl AtrConfig {
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

impl Default for AtrConfig {
    /// ATR(14).
    fn default() -> Self {
        Self { length: 14 }
    }
}

impl Display for AtrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AtrConfig({})", self.length)
    }
}

/// Average True Range with Wilder's smoothing.
///
/// True range needs a previous close, so the first bar only primes the
/// indicator. The first `length` true ranges are averaged with a simple
/// mean; afterwards `ATR = (ATR × (length − 1) + TR) / length`.
#[derive(Clone, Debug)]
pub struct Atr {
    config: AtrConfig,
    prev_close: Option<Price>,
    seed_sum: f64,
    seen_ranges: usize,
    length_reciprocal: f64,
    length_minus_one: f64,
    current: Option<Price>,
}

impl Indicator for Atr {
    type Config = AtrConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            prev_close: None,
            seed_sum: 0.0,
            seen_ranges: 0,
            #[allow(clippy::cast_precision_loss)]
            length_reciprocal: 1.0 / config.length as f64,
            #[allow(clippy::cast_precision_loss)]
            length_minus_one: (config.length - 1) as f64,
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Price> {
        let Some(prev_close) = self.prev_close.replace(ohlcv.close()) else {
            return None;
        };
        let tr = PriceSource::TrueRange.extract(ohlcv, Some(prev_close));

        self.current = match self.current {
            Some(atr) => Some(atr.mul_add(self.length_minus_one, tr) * self.length_reciprocal),
            None => {
                self.seed_sum += tr;
                self.seen_ranges += 1;
                (self.seen_ranges == self.config.length)
                    .then(|| self.seed_sum * self.length_reciprocal)
            }
        };

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({})", self.config.length)
    }
}

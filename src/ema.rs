use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource};

/// Configuration for the Exponential Moving Average ([`Ema`]) indicator.
///
/// # Example
///
/// ```
/// use chartlab_ta::{EmaConfig, IndicatorConfig};
/// use std::num::NonZero;
///
/// let config = EmaConfig::close(NonZero::new(20).unwrap());
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.warm_up(), 1);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for EmaConfig {
    /// EMA is seeded with the first price, so it is defined from bar one.
    #[inline]
    fn warm_up(&self) -> usize {
        1
    }
}

impl EmaConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>, source: PriceSource) -> Self {
        Self {
            length: length.get(),
            source,
        }
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, PriceSource::Close)
    }

    /// Smoothing length (number of bars).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> PriceSource {
        self.source
    }

    /// Smoothing factor `k = 2 / (length + 1)`.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let denominator = (self.length + 1) as f64;
        2.0 / denominator
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Exponential Moving Average (EMA).
///
/// ```text
/// EMA[0] = price[0]
/// EMA[i] = price[i] × k + EMA[i−1] × (1 − k),   k = 2 / (length + 1)
/// ```
///
/// Unlike [`Sma`](crate::Sma) there is no insufficient-history gap: the
/// first price seeds the average. Each update is a single fused multiply-add
/// on the carried previous value.
///
/// # Example
///
/// ```
/// use chartlab_ta::{Bar, Ema, EmaConfig};
/// use std::num::NonZero;
///
/// let bar = |close, t| Bar::new(t, close, close, close, close, 0).unwrap();
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
///
/// assert_eq!(ema.compute(&bar(4.0, 1)), Some(4.0));
/// // k = 0.5: 8 × 0.5 + 4 × 0.5 = 6
/// assert_eq!(ema.compute(&bar(8.0, 2)), Some(6.0));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    alpha: f64,
    prev_close: Option<Price>,
    current: Option<Price>,
}

impl Ema {
    /// Feeds an already extracted value. MACD uses this to smooth its own
    /// line into the signal line.
    #[inline]
    pub(crate) fn update(&mut self, price: Price) -> Price {
        let next = match self.current {
            Some(previous) => self.alpha.mul_add(price - previous, previous),
            None => price,
        };
        self.current = Some(next);
        next
    }
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            alpha: config.alpha(),
            prev_close: None,
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Price> {
        let price = self.config.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());
        Some(self.update(price))
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}

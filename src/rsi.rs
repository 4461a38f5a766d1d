use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource};

/// Configuration for the Relative Strength Index ([`Rsi`]) indicator.
///
/// RSI uses Wilder's smoothing, which has infinite memory: the SMA seed
/// (first `length` price changes) influences all subsequent values. Output
/// begins at bar index `length`.
///
/// # Example
///
/// ```
/// use chartlab_ta::{IndicatorConfig, RsiConfig};
///
/// let config = RsiConfig::default();
/// assert_eq!(config.length(), 14);
/// assert_eq!(config.warm_up(), 15);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for RsiConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        self.length + 1
    }
}

impl RsiConfig {
    /// RSI on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
            source: PriceSource::Close,
        }
    }

    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RsiConfig {
    /// RSI(14) on close.
    fn default() -> Self {
        Self {
            length: 14,
            source: PriceSource::Close,
        }
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsiConfig({}, {})", self.length, self.source)
    }
}

#[derive(Clone, Debug)]
enum RsiPhase {
    Seeding {
        sum_gain: f64,
        sum_loss: f64,
        seen_changes: usize,
    },
    Active {
        avg_gain: f64,
        avg_loss: f64,
    },
}

/// Relative Strength Index (RSI) with Wilder's smoothing.
///
/// Measures the speed and magnitude of recent price changes on a 0–100
/// scale. The first `length` price changes are averaged with a simple mean;
/// after that:
///
/// ```text
/// avg_gain = (avg_gain × (length − 1) + gain) / length
/// avg_loss = (avg_loss × (length − 1) + loss) / length
/// RSI      = 100 − 100 / (1 + avg_gain / avg_loss)
/// ```
///
/// When `avg_loss` is zero the ratio is undefined; RSI is then exactly
/// `100`, never infinity or NaN.
///
/// # Example
///
/// ```
/// use chartlab_ta::{Bar, Rsi, RsiConfig};
/// use std::num::NonZero;
///
/// let bar = |close, t| Bar::new(t, close, close, close, close, 0).unwrap();
/// let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(3).unwrap()));
///
/// // Seeding: need 3 price changes (4 bars)
/// assert_eq!(rsi.compute(&bar(10.0, 1)), None);
/// assert_eq!(rsi.compute(&bar(12.0, 2)), None);
/// assert_eq!(rsi.compute(&bar(11.0, 3)), None);
///
/// // changes = +2, −1, +2 → avg_gain=4/3, avg_loss=1/3 → RSI=80
/// let value = rsi.compute(&bar(13.0, 4)).unwrap();
/// assert!((value - 80.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
    prev_price: Option<Price>,
    prev_close: Option<Price>,
    phase: RsiPhase,
    current: Option<Price>,
    length_reciprocal: f64,
    length_minus_one: f64,
}

impl Indicator for Rsi {
    type Config = RsiConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            prev_price: None,
            prev_close: None,
            phase: RsiPhase::Seeding {
                sum_gain: 0.0,
                sum_loss: 0.0,
                seen_changes: 0,
            },
            current: None,
            #[allow(clippy::cast_precision_loss)]
            length_reciprocal: 1.0 / config.length as f64,
            #[allow(clippy::cast_precision_loss)]
            length_minus_one: (config.length - 1) as f64,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        let price = self.config.source.extract(ohlcv, self.prev_close);
        self.prev_close = Some(ohlcv.close());

        let Some(prev_price) = self.prev_price.replace(price) else {
            // First bar: no change yet.
            return None;
        };
        let (gain, loss) = Self::gain_and_loss(prev_price, price);

        self.current = match &mut self.phase {
            RsiPhase::Seeding {
                sum_gain,
                sum_loss,
                seen_changes,
            } => {
                *sum_gain += gain;
                *sum_loss += loss;
                *seen_changes += 1;

                if *seen_changes == self.config.length {
                    let avg_gain = *sum_gain * self.length_reciprocal;
                    let avg_loss = *sum_loss * self.length_reciprocal;
                    self.phase = RsiPhase::Active { avg_gain, avg_loss };
                    Some(Self::rsi_from_averages(avg_gain, avg_loss))
                } else {
                    None
                }
            }

            RsiPhase::Active { avg_gain, avg_loss } => {
                *avg_gain = avg_gain.mul_add(self.length_minus_one, gain) * self.length_reciprocal;
                *avg_loss = avg_loss.mul_add(self.length_minus_one, loss) * self.length_reciprocal;
                Some(Self::rsi_from_averages(*avg_gain, *avg_loss))
            }
        };

        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Rsi {
    #[inline]
    fn gain_and_loss(prev_price: Price, price: Price) -> (Price, Price) {
        let change = price - prev_price;
        (change.max(0.0), (-change).max(0.0))
    }

    #[inline]
    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }

        let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        rsi.clamp(0.0, 100.0)
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}, {})", self.config.length, self.config.source)
    }
}

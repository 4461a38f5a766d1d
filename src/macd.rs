use std::{fmt::Display, num::NonZero};

use serde::Serialize;

use crate::{Ema, EmaConfig, Error, Indicator, IndicatorConfig, Ohlcv, Price, Result};

const DEFAULT_FAST: NonZero<usize> = NonZero::new(12).unwrap();
const DEFAULT_SLOW: NonZero<usize> = NonZero::new(26).unwrap();
const DEFAULT_SIGNAL: NonZero<usize> = NonZero::new(9).unwrap();

/// Configuration for the [`Macd`] indicator.
///
/// The fast EMA must be strictly shorter than the slow one.
///
/// # Example
///
/// ```
/// use chartlab_ta::MacdConfig;
/// use std::num::NonZero;
///
/// let config = MacdConfig::builder()
///     .fast(NonZero::new(8).unwrap())
///     .slow(NonZero::new(21).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.signal(), 9);
/// assert!(MacdConfig::builder().fast(NonZero::new(30).unwrap()).build().is_err());
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast: NonZero<usize>,
    slow: NonZero<usize>,
    signal: NonZero<usize>,
}

impl IndicatorConfig for MacdConfig {
    /// Every EMA is defined from the first bar, so MACD is too.
    #[inline]
    fn warm_up(&self) -> usize {
        1
    }
}

impl MacdConfig {
    #[must_use]
    pub fn builder() -> MacdConfigBuilder {
        MacdConfigBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn fast(&self) -> usize {
        self.fast.get()
    }

    #[inline]
    #[must_use]
    pub fn slow(&self) -> usize {
        self.slow.get()
    }

    #[inline]
    #[must_use]
    pub fn signal(&self) -> usize {
        self.signal.get()
    }
}

impl Default for MacdConfig {
    /// MACD(12, 26, 9).
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MacdConfig({}, {}, {})", self.fast, self.slow, self.signal)
    }
}

/// Builder for [`MacdConfig`].
///
/// Defaults: fast = 12, slow = 26, signal = 9.
#[derive(Default)]
pub struct MacdConfigBuilder {
    fast: Option<NonZero<usize>>,
    slow: Option<NonZero<usize>>,
    signal: Option<NonZero<usize>>,
}

impl MacdConfigBuilder {
    #[must_use]
    pub fn fast(mut self, fast: NonZero<usize>) -> Self {
        self.fast = Some(fast);
        self
    }

    #[must_use]
    pub fn slow(mut self, slow: NonZero<usize>) -> Self {
        self.slow = Some(slow);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: NonZero<usize>) -> Self {
        self.signal = Some(signal);
        self
    }

    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `fast >= slow`.
    pub fn build(self) -> Result<MacdConfig> {
        let defaults = MacdConfig::default();
        let config = MacdConfig {
            fast: self.fast.unwrap_or(defaults.fast),
            slow: self.slow.unwrap_or(defaults.slow),
            signal: self.signal.unwrap_or(defaults.signal),
        };

        if config.fast >= config.slow {
            return Err(Error::invalid(
                "MACD",
                format!(
                    "fast length {} must be shorter than slow length {}",
                    config.fast, config.slow
                ),
            ));
        }

        Ok(config)
    }
}

/// MACD output: line, signal line, and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValue {
    macd: f64,
    signal: f64,
    histogram: f64,
}

impl MacdValue {
    /// `EMA(fast) − EMA(slow)`.
    #[inline]
    #[must_use]
    pub fn macd(&self) -> f64 {
        self.macd
    }

    /// EMA of the MACD line.
    #[inline]
    #[must_use]
    pub fn signal(&self) -> f64 {
        self.signal
    }

    /// `macd − signal`.
    #[inline]
    #[must_use]
    pub fn histogram(&self) -> f64 {
        self.histogram
    }

    pub(crate) fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            macd: f(self.macd),
            signal: f(self.signal),
            histogram: f(self.histogram),
        }
    }
}

impl Display for MacdValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD(m: {}, s: {}, h: {})",
            self.macd, self.signal, self.histogram
        )
    }
}

/// Moving Average Convergence Divergence.
///
/// ```text
/// macd      = EMA(fast) − EMA(slow)
/// signal    = EMA(signal) of the defined macd values
/// histogram = macd − signal
/// ```
///
/// All three components are carried state; each bar is three EMA updates.
#[derive(Clone, Debug)]
pub struct Macd {
    config: MacdConfig,
    fast: Ema,
    slow: Ema,
    signal: Ema,
    current: Option<MacdValue>,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdValue;

    fn new(config: Self::Config) -> Self {
        let ema = |length| Ema::new(EmaConfig::close(length));

        Self {
            config,
            fast: ema(config.fast),
            slow: ema(config.slow),
            signal: ema(config.signal),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        let fast = self.fast.compute(ohlcv);
        let slow = self.slow.compute(ohlcv);

        self.current = match (fast, slow) {
            (Some(fast), Some(slow)) => {
                let macd: Price = fast - slow;
                let signal = self.signal.update(macd);
                Some(MacdValue {
                    macd,
                    signal,
                    histogram: macd - signal,
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

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {})",
            self.config.fast, self.config.slow, self.config.signal
        )
    }
}

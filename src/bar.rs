use serde::{Deserialize, Serialize};

use crate::{Error, Ohlcv, Price, Result, Timestamp, Volume};

/// One period's open/high/low/close prices and traded volume.
///
/// Fields are public for cheap construction by feeds and fixtures;
/// [`Bar::new`] and [`BarSeries`] validate the OHLC invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Volume,
}

impl Bar {
    /// Creates a validated bar.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBar`] if any price is non-finite or non-positive, or if
    /// `low <= min(open, close) <= max(open, close) <= high` does not hold.
    pub fn new(
        timestamp: Timestamp,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
    ) -> Result<Self> {
        let bar = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Checks the OHLC invariant.
    ///
    /// # Errors
    ///
    /// See [`Bar::new`].
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason| Error::InvalidBar {
            timestamp: self.timestamp,
            reason,
        };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(invalid("prices must be finite and positive"));
        }
        if self.low > self.open.min(self.close) {
            return Err(invalid("low above open/close"));
        }
        if self.high < self.open.max(self.close) {
            return Err(invalid("high below open/close"));
        }

        Ok(())
    }
}

impl Ohlcv for Bar {
    #[inline]
    fn open(&self) -> Price {
        self.open
    }

    #[inline]
    fn high(&self) -> Price {
        self.high
    }

    #[inline]
    fn low(&self) -> Price {
        self.low
    }

    #[inline]
    fn close(&self) -> Price {
        self.close
    }

    #[inline]
    fn open_time(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    fn volume(&self) -> Volume {
        self.volume
    }
}

/// Ordered bars with strictly increasing timestamps.
///
/// Replaced wholesale on a timeframe change; grows only through
/// [`push`](BarSeries::push), which is where out-of-order bars are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Validates every bar and the timestamp ordering.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBar`] or [`Error::OutOfOrderBar`].
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(Error::OutOfOrderBar {
                last: pair[0].timestamp,
                got: pair[1].timestamp,
            });
        }

        Ok(Self { bars })
    }

    /// Appends a bar.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfOrderBar`] if `bar.timestamp <= last.timestamp`,
    /// [`Error::InvalidBar`] if the bar is malformed. The series is left
    /// untouched on error.
    pub fn push(&mut self, bar: Bar) -> Result<()> {
        bar.validate()?;
        if let Some(last) = self.bars.last()
            && bar.timestamp <= last.timestamp
        {
            return Err(Error::OutOfOrderBar {
                last: last.timestamp,
                got: bar.timestamp,
            });
        }

        self.bars.push(bar);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> impl ExactSizeIterator<Item = Price> + '_ {
        self.bars.iter().map(|b| b.close)
    }
}

impl TryFrom<Vec<Bar>> for BarSeries {
    type Error = Error;

    fn try_from(bars: Vec<Bar>) -> Result<Self> {
        Self::new(bars)
    }
}

use crate::{Ohlcv, Price};

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Price extracted from an [`Ohlcv`] bar before it enters a window.
///
/// Moving averages default to [`Close`](PriceSource::Close). VWAP always
/// weighs the typical price and ATR/ADX always consume the true range.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Closing price.
    #[default]
    Close,
    /// Median price: `(high + low) / 2`.
    #[serde(rename = "hl2")]
    HL2,
    /// Typical price: `(high + low + close) / 3`.
    #[serde(rename = "hlc3")]
    HLC3,
    /// True range: `max(high - low, |high - prev_close|, |low - prev_close|)`.
    ///
    /// Without a previous close, falls back to `high - low`.
    TrueRange,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl PriceSource {
    #[inline]
    pub(crate) fn extract(self, ohlcv: &impl Ohlcv, prev_close: Option<Price>) -> Price {
        match self {
            Self::Close => ohlcv.close(),
            Self::HL2 => f64::midpoint(ohlcv.high(), ohlcv.low()),
            Self::HLC3 => (ohlcv.high() + ohlcv.low() + ohlcv.close()) / 3.0,
            Self::TrueRange => {
                let hl = ohlcv.high() - ohlcv.low();

                prev_close.map_or(hl, |prev_close| {
                    hl.max((ohlcv.high() - prev_close).abs())
                        .max((ohlcv.low() - prev_close).abs())
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, ohlc};

    #[test]
    fn close_reads_close() {
        assert_eq!(PriceSource::Close.extract(&ohlc(10.0, 30.0, 5.0, 20.0, 1), None), 20.0);
    }

    #[test]
    fn hl2_is_midpoint() {
        assert_eq!(PriceSource::HL2.extract(&ohlc(10.0, 30.0, 5.0, 20.0, 1), None), 17.5);
    }

    #[test]
    fn hlc3_is_typical_price() {
        let typical = PriceSource::HLC3.extract(&ohlc(10.0, 30.0, 5.0, 20.0, 1), None);
        assert_approx!(typical, 55.0 / 3.0);
    }

    mod true_range {
        use super::*;

        #[test]
        fn first_bar_is_high_minus_low() {
            let tr = PriceSource::TrueRange.extract(&ohlc(10.0, 30.0, 5.0, 20.0, 1), None);
            assert_eq!(tr, 25.0);
        }

        #[test]
        fn gap_up_measures_from_prev_close() {
            // hl = 10, |30 - 10| = 20, |20 - 10| = 10
            let tr = PriceSource::TrueRange.extract(&ohlc(25.0, 30.0, 20.0, 28.0, 2), Some(10.0));
            assert_eq!(tr, 20.0);
        }

        #[test]
        fn gap_down_measures_from_prev_close() {
            // hl = 10, |15 - 45| = 30, |5 - 45| = 40
            let tr = PriceSource::TrueRange.extract(&ohlc(10.0, 15.0, 5.0, 12.0, 2), Some(45.0));
            assert_eq!(tr, 40.0);
        }
    }
}

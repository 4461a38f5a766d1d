use std::fmt::Display;

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource};

/// Configuration for [`Vwap`]. VWAP has no parameters; it is anchored at the
/// first bar of the series.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct VwapConfig;

impl IndicatorConfig for VwapConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        1
    }
}

impl Display for VwapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VwapConfig")
    }
}

/// Volume-Weighted Average Price, cumulative from the series start.
///
/// ```text
/// typical = (high + low + close) / 3
/// VWAP[i] = Σ typical[j] × volume[j] / Σ volume[j],   j ≤ i
/// ```
///
/// `None` while cumulative volume is zero. Carries two running sums, so each
/// bar is O(1).
#[derive(Clone, Debug, Default)]
pub struct Vwap {
    price_volume: f64,
    volume: f64,
    current: Option<Price>,
}

impl Indicator for Vwap {
    type Config = VwapConfig;
    type Output = Price;

    fn new(_config: Self::Config) -> Self {
        Self::default()
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Price> {
        #[allow(clippy::cast_precision_loss)]
        let volume = ohlcv.volume() as f64;
        let typical = PriceSource::HLC3.extract(ohlcv, None);

        self.price_volume = typical.mul_add(volume, self.price_volume);
        self.volume += volume;

        self.current = (self.volume > 0.0).then(|| self.price_volume / self.volume);
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Vwap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VWAP")
    }
}

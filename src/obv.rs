use std::fmt::Display;

use crate::{Indicator, IndicatorConfig, Ohlcv, Price};

/// Configuration for [`Obv`]. OBV has no parameters.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct ObvConfig;

impl IndicatorConfig for ObvConfig {
    #[inline]
    fn warm_up(&self) -> usize {
        1
    }
}

impl Display for ObvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ObvConfig")
    }
}

/// On-Balance Volume.
///
/// Starts at zero on the first bar, then adds the bar's volume on an up
/// close, subtracts it on a down close, and carries it on an unchanged close.
#[derive(Clone, Debug, Default)]
pub struct Obv {
    prev_close: Option<Price>,
    current: Option<f64>,
}

impl Indicator for Obv {
    type Config = ObvConfig;
    type Output = f64;

    fn new(_config: Self::Config) -> Self {
        Self::default()
    }

    #[inline]
    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<f64> {
        let close = ohlcv.close();
        #[allow(clippy::cast_precision_loss)]
        let volume = ohlcv.volume() as f64;

        let previous = self.current.unwrap_or(0.0);
        let next = match self.prev_close {
            None => 0.0,
            Some(prev) if close > prev => previous + volume,
            Some(prev) if close < prev => previous - volume,
            Some(_) => previous,
        };

        self.prev_close = Some(close);
        self.current = Some(next);
        self.current
    }

    #[inline]
    fn value(&self) -> Option<f64> {
        self.current
    }
}

impl Display for Obv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OBV")
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::bar_with_volume;

    #[test]
    fn first_bar_is_zero() {
        let mut obv = Obv::new(ObvConfig);
        assert_eq!(obv.compute(&bar_with_volume(10.0, 500, 1)), Some(0.0));
    }

    #[test]
    fn accumulates_by_close_direction() {
        let mut obv = Obv::new(ObvConfig);
        let steps = [(10.0, 100), (11.0, 200), (10.5, 50), (10.5, 70), (12.0, 30)];
        let out: Vec<_> = steps
            .iter()
            .zip(1..)
            .map(|(&(close, volume), t)| obv.compute(&bar_with_volume(close, volume, t)))
            .collect();

        assert_eq!(
            out,
            vec![Some(0.0), Some(200.0), Some(150.0), Some(150.0), Some(180.0)]
        );
    }
}

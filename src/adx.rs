use std::{fmt::Display, num::NonZero};

use serde::Serialize;

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource};

/// Configuration for the Average Directional Index ([`Adx`]).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct AdxConfig {
    length: usize,
}

impl IndicatorConfig for AdxConfig {
    /// `length` transitions to seed the DI smoothing, then `length` DX
    /// values to seed ADX itself.
    #[inline]
    fn warm_up(&self) -> usize {
        2 * self.length
    }
}

impl AdxConfig {
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

impl Default for AdxConfig {
    /// ADX(14).
    fn default() -> Self {
        Self { length: 14 }
    }
}

impl Display for AdxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdxConfig({})", self.length)
    }
}

/// ADX output: trend strength plus both directional indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdxValue {
    adx: f64,
    plus_di: f64,
    minus_di: f64,
}

impl AdxValue {
    #[inline]
    #[must_use]
    pub fn adx(&self) -> f64 {
        self.adx
    }

    /// `+DI`, in `[0, 100]`.
    #[inline]
    #[must_use]
    pub fn plus_di(&self) -> f64 {
        self.plus_di
    }

    /// `−DI`, in `[0, 100]`.
    #[inline]
    #[must_use]
    pub fn minus_di(&self) -> f64 {
        self.minus_di
    }

    pub(crate) fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            adx: f(self.adx),
            plus_di: f(self.plus_di),
            minus_di: f(self.minus_di),
        }
    }
}

impl Display for AdxValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ADX(adx: {}, +di: {}, -di: {})",
            self.adx, self.plus_di, self.minus_di
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Movement {
    plus_dm: f64,
    minus_dm: f64,
    tr: f64,
}

#[derive(Clone, Debug)]
enum AdxPhase {
    /// Summing the first `length` directional movements.
    Seeding { sum: Movement, seen: usize },
    /// DI values are smoothed; collecting the first `length` DX values.
    SeedingDx {
        smoothed: Movement,
        dx_sum: f64,
        seen: usize,
    },
    Active { smoothed: Movement, adx: f64 },
}

/// Average Directional Index with Wilder's smoothing.
///
/// ```text
/// +DM = up_move   if up_move > down_move and up_move > 0, else 0
/// −DM = down_move if down_move > up_move and down_move > 0, else 0
/// ±DI = 100 × smoothed(±DM) / smoothed(TR)
/// DX  = 100 × |+DI − −DI| / (+DI + −DI)
/// ADX = Wilder average of DX
/// ```
///
/// A zero smoothed true range gives both DIs as `0`, and a zero DI sum gives
/// DX `0`; no NaN leaves the indicator. The first value appears at bar index
/// `2 × length − 1`.
#[derive(Clone, Debug)]
pub struct Adx {
    config: AdxConfig,
    prev: Option<(Price, Price, Price)>,
    phase: AdxPhase,
    length_reciprocal: f64,
    length_minus_one: f64,
    current: Option<AdxValue>,
}

impl Adx {
    fn smooth(&self, prev: f64, next: f64) -> f64 {
        prev.mul_add(self.length_minus_one, next) * self.length_reciprocal
    }

    fn smooth_movement(&self, prev: Movement, next: Movement) -> Movement {
        Movement {
            plus_dm: self.smooth(prev.plus_dm, next.plus_dm),
            minus_dm: self.smooth(prev.minus_dm, next.minus_dm),
            tr: self.smooth(prev.tr, next.tr),
        }
    }

    fn directional(smoothed: Movement) -> (f64, f64, f64) {
        if smoothed.tr == 0.0 {
            return (0.0, 0.0, 0.0);
        }

        let plus_di = 100.0 * smoothed.plus_dm / smoothed.tr;
        let minus_di = 100.0 * smoothed.minus_dm / smoothed.tr;
        let di_sum = plus_di + minus_di;
        let dx = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };

        (plus_di, minus_di, dx)
    }
}

impl Indicator for Adx {
    type Config = AdxConfig;
    type Output = AdxValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            prev: None,
            phase: AdxPhase::Seeding {
                sum: Movement::default(),
                seen: 0,
            },
            #[allow(clippy::cast_precision_loss)]
            length_reciprocal: 1.0 / config.length as f64,
            #[allow(clippy::cast_precision_loss)]
            length_minus_one: (config.length - 1) as f64,
            current: None,
        }
    }

    fn compute(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        let (high, low, close) = (ohlcv.high(), ohlcv.low(), ohlcv.close());
        let Some((prev_high, prev_low, prev_close)) = self.prev.replace((high, low, close)) else {
            return None;
        };

        let up_move = high - prev_high;
        let down_move = prev_low - low;
        let movement = Movement {
            plus_dm: if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 },
            minus_dm: if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 },
            tr: PriceSource::TrueRange.extract(ohlcv, Some(prev_close)),
        };

        let length = self.config.length;

        let (next_phase, current) = match self.phase.clone() {
            AdxPhase::Seeding { sum, seen } => {
                let sum = Movement {
                    plus_dm: sum.plus_dm + movement.plus_dm,
                    minus_dm: sum.minus_dm + movement.minus_dm,
                    tr: sum.tr + movement.tr,
                };
                let seen = seen + 1;

                if seen < length {
                    (AdxPhase::Seeding { sum, seen }, None)
                } else {
                    let smoothed = Movement {
                        plus_dm: sum.plus_dm * self.length_reciprocal,
                        minus_dm: sum.minus_dm * self.length_reciprocal,
                        tr: sum.tr * self.length_reciprocal,
                    };
                    self.after_smoothing(smoothed, 0.0, 0)
                }
            }
            AdxPhase::SeedingDx {
                smoothed,
                dx_sum,
                seen,
            } => self.after_smoothing(self.smooth_movement(smoothed, movement), dx_sum, seen),
            AdxPhase::Active { smoothed, adx } => {
                let smoothed = self.smooth_movement(smoothed, movement);
                let (plus_di, minus_di, dx) = Self::directional(smoothed);
                let adx = self.smooth(adx, dx);
                (
                    AdxPhase::Active { smoothed, adx },
                    Some(AdxValue {
                        adx,
                        plus_di,
                        minus_di,
                    }),
                )
            }
        };

        self.phase = next_phase;
        self.current = current;
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Adx {
    /// Folds one DX value into the ADX seed and switches to the active
    /// phase once `length` DX values have been collected.
    fn after_smoothing(
        &self,
        smoothed: Movement,
        dx_sum: f64,
        seen: usize,
    ) -> (AdxPhase, Option<AdxValue>) {
        let (plus_di, minus_di, dx) = Self::directional(smoothed);
        let dx_sum = dx_sum + dx;
        let seen = seen + 1;

        if seen < self.config.length {
            return (
                AdxPhase::SeedingDx {
                    smoothed,
                    dx_sum,
                    seen,
                },
                None,
            );
        }

        let adx = dx_sum * self.length_reciprocal;
        (
            AdxPhase::Active { smoothed, adx },
            Some(AdxValue {
                adx,
                plus_di,
                minus_di,
            }),
        )
    }
}

impl Display for Adx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ADX({})", self.config.length)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_near, nz, ohlc};

    fn adx(length: usize) -> Adx {
        Adx::new(AdxConfig::new(nz(length)))
    }

    /// Steady uptrend: each bar one higher than the last.
    fn rising(t: u64) -> crate::Bar {
        #[allow(clippy::cast_precision_loss)]
        let base = 100.0 + t as f64;
        ohlc(base, base + 1.0, base - 1.0, base + 0.5, t)
    }

    #[test]
    fn first_value_at_twice_length_minus_one() {
        let mut adx = adx(3);
        for t in 0..5 {
            assert_eq!(adx.compute(&rising(t)), None, "bar {t}");
        }
        assert!(adx.compute(&rising(5)).is_some());
        assert_eq!(AdxConfig::new(nz(3)).warm_up(), 6);
    }

    #[test]
    fn pure_uptrend_has_full_strength() {
        let mut adx = adx(3);
        for t in 0..20 {
            adx.compute(&rising(t));
        }
        let v = adx.value().unwrap();
        assert_eq!(v.minus_di(), 0.0);
        assert_near!(v.adx(), 100.0, 1e-9);
        assert!(v.plus_di() > 0.0);
    }

    #[test]
    fn flat_market_clamps_to_zero() {
        let mut adx = adx(2);
        for t in 0..10 {
            adx.compute(&ohlc(50.0, 50.0, 50.0, 50.0, t));
        }
        let v = adx.value().unwrap();
        assert_eq!((v.adx(), v.plus_di(), v.minus_di()), (0.0, 0.0, 0.0));
    }

    #[test]
    fn stays_within_bounds_on_choppy_data() {
        let mut adx = adx(4);
        let closes = [10.0, 11.5, 10.2, 12.8, 11.1, 9.7, 10.9, 12.2, 11.4, 13.0, 12.1, 10.8];
        for (t, c) in (0..).zip(closes) {
            if let Some(v) = adx.compute(&ohlc(c, c + 0.8, c - 0.6, c + 0.1, t)) {
                assert!((0.0..=100.0).contains(&v.adx()));
                assert!((0.0..=100.0).contains(&v.plus_di()));
                assert!((0.0..=100.0).contains(&v.minus_di()));
            }
        }
    }
}

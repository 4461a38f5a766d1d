// src/test_util.rs

use crate::{Bar, Volume};
use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

/// Asserts that two `f64` values are within an absolute tolerance.
macro_rules! assert_near {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let (a, e, t) = ($actual, $expected, $tolerance);
        assert!(
            (a - e).abs() <= t,
            "assert_near failed: actual={a}, expected={e}, diff={} > {t}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;
pub(crate) use assert_near;

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

/// Unvalidated bar with zero volume.
pub fn ohlc(open: f64, high: f64, low: f64, close: f64, timestamp: u64) -> Bar {
    Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume: 0,
    }
}

/// Convenience: bar with just a close price and timestamp (OHLC all equal to close).
pub fn bar(close: f64, timestamp: u64) -> Bar {
    ohlc(close, close, close, close, timestamp)
}

/// Flat bar carrying volume.
pub fn bar_with_volume(close: f64, volume: Volume, timestamp: u64) -> Bar {
    Bar {
        volume,
        ..bar(close, timestamp)
    }
}

/// Flat bars for `closes`, timestamps starting at 1.
pub fn bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .zip(1..)
        .map(|(&close, t)| bar(close, t))
        .collect()
}

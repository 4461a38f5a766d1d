#![allow(dead_code)]

use chartlab_ta::{Bar, BarSeries, Timestamp};
use serde::{Deserialize, de::DeserializeOwned};
use std::num::NonZero;

/// Hourly random-walk bars; two bars (index 37 and 38) carry zero volume.
const BARS_PATH: &str = "tests/fixtures/data/bars-1h.csv";

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub timestamp: Timestamp,
    pub expected: f64,
}

#[derive(Debug, Deserialize)]
pub struct RefBands {
    pub timestamp: Timestamp,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Deserialize)]
pub struct RefMacd {
    pub timestamp: Timestamp,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Deserialize)]
pub struct RefAdx {
    pub timestamp: Timestamp,
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

#[derive(Debug, Deserialize)]
pub struct RefStoch {
    pub timestamp: Timestamp,
    pub k: f64,
    pub d: f64,
}

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).expect("non zero value")
}

/// Load the fixture bars.
pub fn load_bars() -> Vec<Bar> {
    load_records(BARS_PATH, "invalid bar record")
}

/// Load the fixture bars as a validated series.
pub fn load_series() -> BarSeries {
    BarSeries::new(load_bars()).expect("fixture bars are well formed")
}

/// Load reference rows of any shape.
pub fn load_ref<D: DeserializeOwned>(path: &str) -> Vec<D> {
    load_records(path, "invalid reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Walks `bars` through `compute` and checks the output against
/// `reference`: a value exactly at the reference timestamps, `None`
/// everywhere else.
pub fn check_against_reference<R, T>(
    name: &str,
    bars: &[Bar],
    reference: &[R],
    timestamp: impl Fn(&R) -> Timestamp,
    mut compute: impl FnMut(&Bar) -> Option<T>,
    mut check: impl FnMut(&T, &R, &str),
) where
    T: std::fmt::Debug,
{
    let mut ref_idx = 0;
    for bar in bars {
        let value = compute(bar);

        match reference.get(ref_idx) {
            Some(expected) if timestamp(expected) == bar.timestamp => {
                let value = value
                    .unwrap_or_else(|| panic!("{name} returned None at t={}", bar.timestamp));
                check(&value, expected, &format!("{name} at bar {ref_idx} (t={})", bar.timestamp));
                ref_idx += 1;
            }
            _ => assert!(
                value.is_none(),
                "{name} returned {value:?} before its warm-up ended (t={})",
                bar.timestamp
            ),
        }
    }

    assert_eq!(
        ref_idx,
        reference.len(),
        "not all reference values checked: {ref_idx}/{}",
        reference.len()
    );
}

/// Generate a reference test for a single-value indicator.
///
/// Usage: `reference_test!(sma_20, Sma, SmaConfig::close(nz(20)), "tests/fixtures/data/sma-20-close.csv", 1e-6);`
#[allow(unused_macros)]
macro_rules! reference_test {
    ($name:ident, $ind:ty, $config:expr, $ref_path:expr, $tolerance:expr) => {
        #[test]
        fn $name() {
            use crate::fixtures::*;

            let bars = load_bars();
            let reference: Vec<RefValue> = load_ref($ref_path);
            let mut ind = <$ind>::new($config);

            check_against_reference(
                stringify!($name),
                &bars,
                &reference,
                |r| r.timestamp,
                |bar| ind.compute(bar),
                |value, r, context| assert_near(*value, r.expected, $tolerance, context),
            );
        }
    };
}

#[allow(unused_imports)]
pub(crate) use reference_test;

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}

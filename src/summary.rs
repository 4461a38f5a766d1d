//! Scalar statistics for the summary panel, derived from the enriched tail.

use std::num::NonZero;

use serde::Serialize;

use crate::{
    BarSeries, EnrichedSeries, Indicator, IndicatorKind, IndicatorValue, Price, Rsi, RsiConfig,
    Sma, SmaConfig,
};

const MOMENTUM_LOOKBACK: usize = 10;
const TREND_SMA_LENGTH: NonZero<usize> = NonZero::new(20).unwrap();
const TRADING_DAYS: f64 = 252.0;
/// Trend strength, in percent, inside which the trend counts as flat.
const FLAT_BAND: f64 = 0.5;

/// Direction of the latest close relative to its 20-bar average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Summary statistics. Each field is `None` when the series is too short
/// for it; a shorter window is never substituted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SummaryStats {
    pub last_close: Option<Price>,
    /// `close[n−1] − close[n−2]`.
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    /// Annualized population standard deviation of log returns.
    pub volatility: Option<f64>,
    /// Percent change versus the close ten bars back.
    pub momentum: Option<f64>,
    /// Percent deviation of the last close from SMA(20).
    pub trend_strength: Option<f64>,
    /// Latest RSI(14).
    pub relative_strength: Option<f64>,
}

impl SummaryStats {
    /// `Flat` within ±0.5 % trend strength, and while trend strength is
    /// unknown.
    #[must_use]
    pub fn trend(&self) -> Trend {
        match self.trend_strength {
            Some(strength) if strength > FLAT_BAND => Trend::Up,
            Some(strength) if strength < -FLAT_BAND => Trend::Down,
            _ => Trend::Flat,
        }
    }
}

fn percent_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

fn volatility(series: &BarSeries) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let returns = || series.bars().windows(2).map(|w| (w[1].close / w[0].close).ln());
    #[allow(clippy::cast_precision_loss)]
    let count = (series.len() - 1) as f64;
    let mean = returns().sum::<f64>() / count;
    let variance = returns().map(|r| (r - mean).powi(2)).sum::<f64>() / count;

    Some(variance.sqrt() * TRADING_DAYS.sqrt())
}

/// Latest value of `kind`: read from its column when `enriched` carries
/// one, otherwise streamed over the bars.
fn latest<I>(enriched: &EnrichedSeries, kind: IndicatorKind, mut indicator: I) -> Option<f64>
where
    I: Indicator<Output = f64>,
{
    if let Some(column) = enriched.column(kind) {
        return column.last().and_then(IndicatorValue::as_scalar);
    }

    enriched
        .series()
        .bars()
        .iter()
        .fold(None, |_, bar| indicator.compute(bar))
}

/// Derives [`SummaryStats`] from `enriched`. Pure; an enabled SMA(20) or
/// RSI(14) column is reused, so the result does not depend on which columns
/// are enabled.
#[must_use]
pub fn summarize(enriched: &EnrichedSeries) -> SummaryStats {
    let series = enriched.series();
    let Some(last) = series.last().map(|bar| bar.close) else {
        return SummaryStats::default();
    };

    let close_back = |offset: usize| {
        series
            .len()
            .checked_sub(offset)
            .and_then(|i| series.get(i))
            .map(|bar| bar.close)
    };
    let previous = close_back(2);

    let trend_sma = SmaConfig::close(TREND_SMA_LENGTH);
    let average = latest(enriched, IndicatorKind::Sma(trend_sma), Sma::new(trend_sma));
    let rsi = RsiConfig::default();
    let relative_strength = latest(enriched, IndicatorKind::Rsi(rsi), Rsi::new(rsi));

    SummaryStats {
        last_close: Some(last),
        change: previous.map(|prev| last - prev),
        change_percent: previous.map(|prev| percent_change(prev, last)),
        volatility: volatility(series),
        momentum: close_back(MOMENTUM_LOOKBACK).map(|from| percent_change(from, last)),
        trend_strength: average.map(|average| percent_change(average, last)),
        relative_strength,
    }
}

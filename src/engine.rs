//! Full and incremental computation of indicator columns over a
//! [`BarSeries`].

use std::fmt::Display;

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    Adx, AdxValue, Atr, Bar, BarSeries, Bb, BbValue, Ema, Indicator, IndicatorKind,
    IndicatorSpec, Macd, MacdValue, Obv, Result, Rsi, Sma, Stoch, StochValue, ValueScale, Vwap,
    WilliamsR,
};

/// Value of one indicator at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Scalar(f64),
    Macd(MacdValue),
    Bands(BbValue),
    Adx(AdxValue),
    Stochastic(StochValue),
}

impl IndicatorValue {
    /// The value rounded for presentation. Computation always keeps full
    /// precision; call this only on the way out.
    #[must_use]
    pub fn rounded(self, scale: ValueScale) -> Self {
        let round = |value| scale.round(value);
        match self {
            Self::Scalar(value) => Self::Scalar(round(value)),
            Self::Macd(value) => Self::Macd(value.map(round)),
            Self::Bands(value) => Self::Bands(value.map(round)),
            Self::Adx(value) => Self::Adx(value.map(round)),
            Self::Stochastic(value) => Self::Stochastic(value.map(round)),
        }
    }

    #[must_use]
    pub fn as_scalar(self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for IndicatorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Macd(value) => value.fmt(f),
            Self::Bands(value) => value.fmt(f),
            Self::Adx(value) => value.fmt(f),
            Self::Stochastic(value) => value.fmt(f),
        }
    }
}

/// One indicator's values, aligned index for index with the bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    kind: IndicatorKind,
    values: Vec<Option<IndicatorValue>>,
}

impl Column {
    #[must_use]
    pub fn kind(&self) -> IndicatorKind {
        self.kind
    }

    /// `None` entries mark bars without enough history.
    #[must_use]
    pub fn values(&self) -> &[Option<IndicatorValue>] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).copied().flatten()
    }

    #[must_use]
    pub fn last(&self) -> Option<IndicatorValue> {
        self.values.last().copied().flatten()
    }
}

/// Bars plus one column per enabled indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrichedSeries {
    series: BarSeries,
    columns: Vec<Column>,
}

impl EnrichedSeries {
    #[must_use]
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First column computing `kind`.
    #[must_use]
    pub fn column(&self, kind: IndicatorKind) -> Option<&Column> {
        self.columns.iter().find(|column| column.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Bar `index` with every column's value at that bar.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<IndicatorPoint> {
        let bar = *self.series.get(index)?;
        let values = self
            .columns
            .iter()
            .map(|column| (column.kind, column.get(index)))
            .collect();

        Some(IndicatorPoint { bar, values })
    }

    pub fn points(&self) -> impl Iterator<Item = IndicatorPoint> + '_ {
        (0..self.len()).filter_map(|index| self.point(index))
    }
}

/// One bar and the indicator values computed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorPoint {
    pub bar: Bar,
    pub values: Vec<(IndicatorKind, Option<IndicatorValue>)>,
}

impl IndicatorPoint {
    /// Values rounded to each indicator's [`ValueScale`].
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            bar: self.bar,
            values: self
                .values
                .iter()
                .map(|&(kind, value)| (kind, value.map(|v| v.rounded(kind.scale()))))
                .collect(),
        }
    }

    #[must_use]
    pub fn value(&self, kind: IndicatorKind) -> Option<IndicatorValue> {
        self.values
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, value)| *value)
    }
}

/// Streaming state of one enabled indicator.
#[derive(Clone, Debug)]
enum Stream {
    Sma(Sma),
    Ema(Ema),
    Rsi(Rsi),
    Macd(Macd),
    Bb(Bb),
    Vwap(Vwap),
    Atr(Atr),
    Adx(Adx),
    Stochastic(Stoch),
    WilliamsR(WilliamsR),
    Obv(Obv),
}

impl Stream {
    fn new(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Sma(config) => Self::Sma(Sma::new(config)),
            IndicatorKind::Ema(config) => Self::Ema(Ema::new(config)),
            IndicatorKind::Rsi(config) => Self::Rsi(Rsi::new(config)),
            IndicatorKind::Macd(config) => Self::Macd(Macd::new(config)),
            IndicatorKind::Bb(config) => Self::Bb(Bb::new(config)),
            IndicatorKind::Vwap => Self::Vwap(Vwap::default()),
            IndicatorKind::Atr(config) => Self::Atr(Atr::new(config)),
            IndicatorKind::Adx(config) => Self::Adx(Adx::new(config)),
            IndicatorKind::Stochastic(config) => Self::Stochastic(Stoch::new(config)),
            IndicatorKind::WilliamsR(config) => Self::WilliamsR(WilliamsR::new(config)),
            IndicatorKind::Obv => Self::Obv(Obv::default()),
        }
    }

    fn compute(&mut self, bar: &Bar) -> Option<IndicatorValue> {
        match self {
            Self::Sma(sma) => sma.compute(bar).map(IndicatorValue::Scalar),
            Self::Ema(ema) => ema.compute(bar).map(IndicatorValue::Scalar),
            Self::Rsi(rsi) => rsi.compute(bar).map(IndicatorValue::Scalar),
            Self::Macd(macd) => macd.compute(bar).map(IndicatorValue::Macd),
            Self::Bb(bb) => bb.compute(bar).map(IndicatorValue::Bands),
            Self::Vwap(vwap) => vwap.compute(bar).map(IndicatorValue::Scalar),
            Self::Atr(atr) => atr.compute(bar).map(IndicatorValue::Scalar),
            Self::Adx(adx) => adx.compute(bar).map(IndicatorValue::Adx),
            Self::Stochastic(stoch) => stoch.compute(bar).map(IndicatorValue::Stochastic),
            Self::WilliamsR(wr) => wr.compute(bar).map(IndicatorValue::Scalar),
            Self::Obv(obv) => obv.compute(bar).map(IndicatorValue::Scalar),
        }
    }
}

/// Computes indicator columns for the enabled specs.
///
/// [`recompute`](Self::recompute) does a full pass and leaves the engine
/// positioned at the last bar, so [`append`](Self::append) can extend the
/// result one bar at a time. Both paths run the same streaming indicators,
/// so they agree exactly.
///
/// # Example
///
/// ```
/// use chartlab_ta::{
///     Bar, BarSeries, IndicatorEngine, IndicatorKind, IndicatorSpec, SmaConfig,
/// };
/// use std::num::NonZero;
///
/// let bars = [10.0, 11.0, 12.0, 11.0, 13.0]
///     .into_iter()
///     .zip(1..)
///     .map(|(c, t)| Bar::new(t, c, c, c, c, 0))
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// let series = BarSeries::new(bars).unwrap();
/// let sma = IndicatorKind::Sma(SmaConfig::close(NonZero::new(3).unwrap()));
///
/// let enriched = IndicatorEngine::compute(&series, &[IndicatorSpec::new(sma)]);
/// let values: Vec<_> = enriched.columns()[0]
///     .values()
///     .iter()
///     .map(|v| v.and_then(|v| v.as_scalar()))
///     .collect();
/// assert_eq!(values[..3], [None, None, Some(11.0)]);
/// assert_eq!(values[4], Some(12.0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct IndicatorEngine {
    specs: Vec<IndicatorSpec>,
    streams: Vec<(IndicatorKind, Stream)>,
}

impl IndicatorEngine {
    #[must_use]
    pub fn new(specs: &[IndicatorSpec]) -> Self {
        let mut engine = Self {
            specs: specs.to_vec(),
            streams: Vec::new(),
        };
        engine.reset();
        engine
    }

    /// One-shot full computation. Deterministic and free of side effects.
    #[must_use]
    pub fn compute(series: &BarSeries, specs: &[IndicatorSpec]) -> EnrichedSeries {
        Self::new(specs).recompute(series)
    }

    #[must_use]
    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    fn reset(&mut self) {
        self.streams = self
            .specs
            .iter()
            .filter(|spec| spec.enabled)
            .map(|spec| (spec.kind, Stream::new(spec.kind)))
            .collect();
    }

    /// Discards streaming state and computes every enabled column over
    /// `series`.
    pub fn recompute(&mut self, series: &BarSeries) -> EnrichedSeries {
        self.reset();

        let mut columns: Vec<Column> = self
            .streams
            .iter()
            .map(|&(kind, _)| Column {
                kind,
                values: Vec::with_capacity(series.len()),
            })
            .collect();

        for bar in series.bars() {
            for ((_, stream), column) in self.streams.iter_mut().zip(&mut columns) {
                column.values.push(stream.compute(bar));
            }
        }

        debug!(bars = series.len(), columns = columns.len(), "recomputed indicators");

        EnrichedSeries {
            series: series.clone(),
            columns,
        }
    }

    /// Appends `bar` to `enriched` and extends every column by one value.
    ///
    /// `enriched` must be the result of this engine's last
    /// [`recompute`](Self::recompute) and the appends since.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfOrderBar`](crate::Error::OutOfOrderBar) or
    /// [`Error::InvalidBar`](crate::Error::InvalidBar); neither the series
    /// nor the engine state changes.
    pub fn append(&mut self, enriched: &mut EnrichedSeries, bar: Bar) -> Result<()> {
        enriched.series.push(bar)?;

        for ((_, stream), column) in self.streams.iter_mut().zip(&mut enriched.columns) {
            column.values.push(stream.compute(&bar));
        }

        trace!(timestamp = bar.timestamp, close = bar.close, "appended bar");
        Ok(())
    }
}

//! Indicator engine, summary analytics and threshold alerts for chart views.
//!
//! The crate is organized leaves first:
//!
//! - [`Bar`] / [`BarSeries`]: validated OHLCV bars in strict time order.
//! - Streaming indicators ([`Sma`], [`Ema`], [`Rsi`], [`Macd`], [`Bb`],
//!   [`Vwap`], [`Atr`], [`Adx`], [`Stoch`], [`WilliamsR`], [`Obv`]) accept any
//!   [`Ohlcv`] type and return `None` until enough history has been seen.
//! - [`IndicatorEngine`] turns a series and a list of [`IndicatorSpec`]s into
//!   an [`EnrichedSeries`], in full or one appended bar at a time.
//! - [`summarize`] derives [`SummaryStats`]; [`ThresholdMonitor`] detects
//!   edge-triggered line crossings; [`RenderMode::select`] picks how a
//!   [`Timeframe`] is drawn.
//! - [`Pipeline`] ties them together behind a single
//!   [`update`](Pipeline::update) entry point fed by [`FeedEvent`]s.
//!
//! Each indicator type exposes [`new`](Sma::new), [`compute`](Sma::compute),
//! and [`value`](Sma::value) as inherent methods, so no trait import is
//! needed. Import [`Indicator`] only for generic code.

mod adx;
mod atr;
mod bar;
mod bb;
mod config;
mod ema;
mod engine;
mod error;
mod feed;
mod indicator;
mod macd;
mod obv;
mod ohlcv;
mod pipeline;
mod price_source;
mod rsi;
mod sma;
mod stoch;
mod summary;
mod threshold;
mod timeframe;
mod vwap;
mod williams_r;
mod window;

pub use crate::bar::{Bar, BarSeries};
pub use crate::error::{Error, Result};
pub use crate::indicator::{Indicator, IndicatorConfig};
pub use crate::ohlcv::{Ohlcv, Price, Timestamp, Volume};
pub use crate::price_source::PriceSource;

pub use crate::adx::{Adx, AdxConfig, AdxValue};
pub use crate::atr::{Atr, AtrConfig};
pub use crate::bb::{Bb, BbConfig, BbConfigBuilder, BbValue, StdDev};
pub use crate::ema::{Ema, EmaConfig};
pub use crate::macd::{Macd, MacdConfig, MacdConfigBuilder, MacdValue};
pub use crate::obv::{Obv, ObvConfig};
pub use crate::rsi::{Rsi, RsiConfig};
pub use crate::sma::{Sma, SmaConfig};
pub use crate::stoch::{Stoch, StochConfig, StochValue};
pub use crate::vwap::{Vwap, VwapConfig};
pub use crate::williams_r::{WilliamsR, WilliamsRConfig};

pub use crate::config::{
    EngineConfig, IndicatorEntry, IndicatorKind, IndicatorParams, IndicatorSpec, LineEntry,
    ValueScale,
};
pub use crate::engine::{Column, EnrichedSeries, IndicatorEngine, IndicatorPoint, IndicatorValue};
pub use crate::feed::{BarFeed, FeedEvent, FixtureFeed, UpdateQueue};
pub use crate::pipeline::Pipeline;
pub use crate::summary::{SummaryStats, Trend, summarize};
pub use crate::threshold::{CrossingEvent, Line, LineId, LineKind, Side, ThresholdMonitor};
pub use crate::timeframe::{RenderMode, Timeframe};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, kline: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::compute(self, kline)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, Price);
impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(Rsi, RsiConfig, f64);
impl_indicator_methods!(Macd, MacdConfig, MacdValue);
impl_indicator_methods!(Bb, BbConfig, BbValue);
impl_indicator_methods!(Vwap, VwapConfig, Price);
impl_indicator_methods!(Atr, AtrConfig, Price);
impl_indicator_methods!(Adx, AdxConfig, AdxValue);
impl_indicator_methods!(Stoch, StochConfig, StochValue);
impl_indicator_methods!(WilliamsR, WilliamsRConfig, f64);
impl_indicator_methods!(Obv, ObvConfig, f64);

#[cfg(test)]
mod test_util;

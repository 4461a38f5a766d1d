//! Chart timeframes and the render mode each one is drawn with.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Chart period selected by the user.
///
/// Parses from and serializes to its short label. Labels are case
/// sensitive: `"1m"` is one minute, `"1M"` is one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[default]
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1D")]
    Day1,
    #[serde(rename = "1W")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
    #[serde(rename = "3M")]
    Month3,
    #[serde(rename = "6M")]
    Month6,
    #[serde(rename = "1Y")]
    Year1,
    #[serde(rename = "5Y")]
    Year5,
    #[serde(rename = "ALL")]
    All,
}

impl Timeframe {
    /// Short label, e.g. `"15m"` or `"1Y"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Min1 => "1m",
            Self::Min5 => "5m",
            Self::Min15 => "15m",
            Self::Min30 => "30m",
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1D",
            Self::Week1 => "1W",
            Self::Month1 => "1M",
            Self::Month3 => "3M",
            Self::Month6 => "6M",
            Self::Year1 => "1Y",
            Self::Year5 => "5Y",
            Self::All => "ALL",
        }
    }

    /// All timeframes, shortest first.
    #[must_use]
    pub fn all() -> &'static [Timeframe] {
        &[
            Self::Min1,
            Self::Min5,
            Self::Min15,
            Self::Min30,
            Self::Hour1,
            Self::Hour4,
            Self::Day1,
            Self::Week1,
            Self::Month1,
            Self::Month3,
            Self::Month6,
            Self::Year1,
            Self::Year5,
            Self::All,
        ]
    }

    #[must_use]
    pub fn render_mode(self) -> RenderMode {
        RenderMode::select(self)
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|timeframe| timeframe.label() == label)
            .ok_or_else(|| Error::UnknownTimeframe(label.to_owned()))
    }
}

/// How the price series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Candlestick,
    Area,
    Line,
}

impl RenderMode {
    /// Intraday timeframes show individual candles, daily to monthly
    /// timeframes an area, and multi-month ranges a plain line.
    #[must_use]
    pub fn select(timeframe: Timeframe) -> Self {
        match timeframe {
            Timeframe::Min1
            | Timeframe::Min5
            | Timeframe::Min15
            | Timeframe::Min30
            | Timeframe::Hour1
            | Timeframe::Hour4 => Self::Candlestick,
            Timeframe::Day1 | Timeframe::Week1 | Timeframe::Month1 => Self::Area,
            Timeframe::Month3
            | Timeframe::Month6
            | Timeframe::Year1
            | Timeframe::Year5
            | Timeframe::All => Self::Line,
        }
    }
}

/// Render mode for `timeframe`. Same as [`RenderMode::select`].
#[must_use]
pub fn select(timeframe: Timeframe) -> RenderMode {
    RenderMode::select(timeframe)
}

//! Indicator selection and engine configuration.
//!
//! [`IndicatorKind`] is the closed set of indicators the engine can compute,
//! each carrying its validated config. [`EngineConfig`] is the TOML-facing
//! form: periods arrive as plain integers and are checked by
//! [`EngineConfig::indicator_specs`].

use std::{fmt::Display, fs, num::NonZero, path::Path};

use serde::{Deserialize, Serialize, Serializer};

use crate::{
    AdxConfig, AtrConfig, BbConfig, EmaConfig, Error, IndicatorConfig, LineKind, MacdConfig,
    Price, PriceSource, Result, RsiConfig, SmaConfig, StochConfig, Timeframe, WilliamsRConfig,
};

/// Decimal precision used when presenting an indicator's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueScale {
    /// Values in price units: two decimals.
    Price,
    /// Bounded or ratio-like values: four decimals.
    Oscillator,
}

impl ValueScale {
    #[must_use]
    pub fn decimals(self) -> i32 {
        match self {
            Self::Price => 2,
            Self::Oscillator => 4,
        }
    }

    /// Rounds half away from zero.
    #[must_use]
    pub fn round(self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals());
        (value * factor).round() / factor
    }
}

/// One indicator the engine can compute, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma(SmaConfig),
    Ema(EmaConfig),
    Rsi(RsiConfig),
    Macd(MacdConfig),
    Bb(BbConfig),
    Vwap,
    Atr(AtrConfig),
    Adx(AdxConfig),
    Stochastic(StochConfig),
    WilliamsR(WilliamsRConfig),
    Obv,
}

impl IndicatorKind {
    #[must_use]
    pub fn scale(&self) -> ValueScale {
        match self {
            Self::Sma(_) | Self::Ema(_) | Self::Bb(_) | Self::Vwap | Self::Atr(_) | Self::Obv => {
                ValueScale::Price
            }
            Self::Rsi(_)
            | Self::Macd(_)
            | Self::Adx(_)
            | Self::Stochastic(_)
            | Self::WilliamsR(_) => ValueScale::Oscillator,
        }
    }

    /// Bars needed before the first value. See [`IndicatorConfig::warm_up`].
    #[must_use]
    pub fn warm_up(&self) -> usize {
        match self {
            Self::Sma(config) => config.warm_up(),
            Self::Ema(config) => config.warm_up(),
            Self::Rsi(config) => config.warm_up(),
            Self::Macd(config) => config.warm_up(),
            Self::Bb(config) => config.warm_up(),
            Self::Atr(config) => config.warm_up(),
            Self::Adx(config) => config.warm_up(),
            Self::Stochastic(config) => config.warm_up(),
            Self::WilliamsR(config) => config.warm_up(),
            Self::Vwap | Self::Obv => 1,
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sma(c) => write!(f, "SMA({}, {})", c.length(), c.source()),
            Self::Ema(c) => write!(f, "EMA({}, {})", c.length(), c.source()),
            Self::Rsi(c) => write!(f, "RSI({})", c.length()),
            Self::Macd(c) => write!(f, "MACD({}, {}, {})", c.fast(), c.slow(), c.signal()),
            Self::Bb(c) => write!(f, "BB({}, {})", c.length(), c.std_dev().value()),
            Self::Vwap => f.write_str("VWAP"),
            Self::Atr(c) => write!(f, "ATR({})", c.length()),
            Self::Adx(c) => write!(f, "ADX({})", c.length()),
            Self::Stochastic(c) => write!(f, "Stoch({}, {})", c.k_length(), c.d_length()),
            Self::WilliamsR(c) => write!(f, "W%R({})", c.length()),
            Self::Obv => f.write_str("OBV"),
        }
    }
}

impl Serialize for IndicatorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        IndicatorParams::from(*self).serialize(serializer)
    }
}

/// An indicator selection: what to compute and whether it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub enabled: bool,
}

impl IndicatorSpec {
    /// Enabled spec for `kind`.
    #[must_use]
    pub fn new(kind: IndicatorKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }

    #[must_use]
    pub fn disabled(kind: IndicatorKind) -> Self {
        Self {
            kind,
            enabled: false,
        }
    }

    /// SMA(20), EMA(20), RSI(14), MACD(12, 26, 9), BB(20, 2) and VWAP
    /// enabled; ATR, ADX, Stochastic, Williams %R and OBV listed but off.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        const TWENTY: NonZero<usize> = NonZero::new(20).unwrap();

        vec![
            Self::new(IndicatorKind::Sma(SmaConfig::close(TWENTY))),
            Self::new(IndicatorKind::Ema(EmaConfig::close(TWENTY))),
            Self::new(IndicatorKind::Rsi(RsiConfig::default())),
            Self::new(IndicatorKind::Macd(MacdConfig::default())),
            Self::new(IndicatorKind::Bb(BbConfig::default())),
            Self::new(IndicatorKind::Vwap),
            Self::disabled(IndicatorKind::Atr(AtrConfig::default())),
            Self::disabled(IndicatorKind::Adx(AdxConfig::default())),
            Self::disabled(IndicatorKind::Stochastic(StochConfig::default())),
            Self::disabled(IndicatorKind::WilliamsR(WilliamsRConfig::default())),
            Self::disabled(IndicatorKind::Obv),
        ]
    }
}

fn period(indicator: &'static str, name: &str, value: i64) -> Result<NonZero<usize>> {
    usize::try_from(value)
        .ok()
        .and_then(NonZero::new)
        .ok_or_else(|| {
            Error::invalid(
                indicator,
                format!("{name} must be a positive integer, got {value}"),
            )
        })
}

fn raw(length: usize) -> i64 {
    i64::try_from(length).unwrap_or(i64::MAX)
}

const fn length_14() -> i64 {
    14
}

const fn length_20() -> i64 {
    20
}

const fn macd_fast() -> i64 {
    12
}

const fn macd_slow() -> i64 {
    26
}

const fn macd_signal() -> i64 {
    9
}

const fn stoch_d() -> i64 {
    3
}

const fn std_dev_2() -> f64 {
    2.0
}

const fn enabled_by_default() -> bool {
    true
}

/// Unvalidated indicator parameters as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorParams {
    Sma {
        #[serde(default = "length_20")]
        length: i64,
        #[serde(default)]
        source: PriceSource,
    },
    Ema {
        #[serde(default = "length_20")]
        length: i64,
        #[serde(default)]
        source: PriceSource,
    },
    Rsi {
        #[serde(default = "length_14")]
        length: i64,
    },
    Macd {
        #[serde(default = "macd_fast")]
        fast: i64,
        #[serde(default = "macd_slow")]
        slow: i64,
        #[serde(default = "macd_signal")]
        signal: i64,
    },
    Bb {
        #[serde(default = "length_20")]
        length: i64,
        #[serde(default = "std_dev_2")]
        std_dev: f64,
    },
    Vwap,
    Atr {
        #[serde(default = "length_14")]
        length: i64,
    },
    Adx {
        #[serde(default = "length_14")]
        length: i64,
    },
    Stochastic {
        #[serde(default = "length_14")]
        k: i64,
        #[serde(default = "stoch_d")]
        d: i64,
    },
    WilliamsR {
        #[serde(default = "length_14")]
        length: i64,
    },
    Obv,
}

impl IndicatorParams {
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for a non-positive period, a non-positive
    /// or non-finite multiplier, or MACD `fast >= slow`.
    pub fn validate(&self) -> Result<IndicatorKind> {
        Ok(match *self {
            Self::Sma { length, source } => {
                IndicatorKind::Sma(SmaConfig::new(period("SMA", "length", length)?, source))
            }
            Self::Ema { length, source } => {
                IndicatorKind::Ema(EmaConfig::new(period("EMA", "length", length)?, source))
            }
            Self::Rsi { length } => {
                IndicatorKind::Rsi(RsiConfig::close(period("RSI", "length", length)?))
            }
            Self::Macd { fast, slow, signal } => IndicatorKind::Macd(
                MacdConfig::builder()
                    .fast(period("MACD", "fast", fast)?)
                    .slow(period("MACD", "slow", slow)?)
                    .signal(period("MACD", "signal", signal)?)
                    .build()?,
            ),
            Self::Bb { length, std_dev } => IndicatorKind::Bb(
                BbConfig::builder()
                    .length(period("Bollinger Bands", "length", length)?)
                    .std_dev(std_dev)
                    .build()?,
            ),
            Self::Vwap => IndicatorKind::Vwap,
            Self::Atr { length } => {
                IndicatorKind::Atr(AtrConfig::new(period("ATR", "length", length)?))
            }
            Self::Adx { length } => {
                IndicatorKind::Adx(AdxConfig::new(period("ADX", "length", length)?))
            }
            Self::Stochastic { k, d } => IndicatorKind::Stochastic(StochConfig::new(
                period("Stochastic", "k", k)?,
                period("Stochastic", "d", d)?,
            )),
            Self::WilliamsR { length } => IndicatorKind::WilliamsR(WilliamsRConfig::new(
                period("Williams %R", "length", length)?,
            )),
            Self::Obv => IndicatorKind::Obv,
        })
    }
}

impl From<IndicatorKind> for IndicatorParams {
    fn from(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Sma(c) => Self::Sma {
                length: raw(c.length()),
                source: c.source(),
            },
            IndicatorKind::Ema(c) => Self::Ema {
                length: raw(c.length()),
                source: c.source(),
            },
            IndicatorKind::Rsi(c) => Self::Rsi {
                length: raw(c.length()),
            },
            IndicatorKind::Macd(c) => Self::Macd {
                fast: raw(c.fast()),
                slow: raw(c.slow()),
                signal: raw(c.signal()),
            },
            IndicatorKind::Bb(c) => Self::Bb {
                length: raw(c.length()),
                std_dev: c.std_dev().value(),
            },
            IndicatorKind::Vwap => Self::Vwap,
            IndicatorKind::Atr(c) => Self::Atr {
                length: raw(c.length()),
            },
            IndicatorKind::Adx(c) => Self::Adx {
                length: raw(c.length()),
            },
            IndicatorKind::Stochastic(c) => Self::Stochastic {
                k: raw(c.k_length()),
                d: raw(c.d_length()),
            },
            IndicatorKind::WilliamsR(c) => Self::WilliamsR {
                length: raw(c.length()),
            },
            IndicatorKind::Obv => Self::Obv,
        }
    }
}

/// `[[indicators]]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEntry {
    #[serde(flatten)]
    pub params: IndicatorParams,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl From<IndicatorSpec> for IndicatorEntry {
    fn from(spec: IndicatorSpec) -> Self {
        Self {
            params: spec.kind.into(),
            enabled: spec.enabled,
        }
    }
}

/// `[[lines]]` table of the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    pub kind: LineKind,
    pub level: Price,
}

/// Engine configuration, loadable from TOML.
///
/// ```toml
/// timeframe = "1D"
///
/// [[indicators]]
/// type = "sma"
/// length = 50
///
/// [[indicators]]
/// type = "stochastic"
/// k = 14
/// d = 3
/// enabled = false
///
/// [[lines]]
/// kind = "alert_above"
/// level = 105.5
/// ```
///
/// Missing sections fall back to [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timeframe: Timeframe,
    pub indicators: Vec<IndicatorEntry>,
    pub lines: Vec<LineEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            indicators: IndicatorSpec::defaults()
                .into_iter()
                .map(IndicatorEntry::from)
                .collect(),
            lines: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// [`Error::ConfigParse`] if `content` is not a valid config document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::ConfigParse`] if it
    /// cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validates every indicator entry, in file order.
    ///
    /// # Errors
    ///
    /// The first [`Error::InvalidParameter`] encountered.
    pub fn indicator_specs(&self) -> Result<Vec<IndicatorSpec>> {
        self.indicators
            .iter()
            .map(|entry| {
                Ok(IndicatorSpec {
                    kind: entry.params.validate()?,
                    enabled: entry.enabled,
                })
            })
            .collect()
    }
}

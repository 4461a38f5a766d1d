use crate::{IndicatorKind, LineId, Timestamp};

/// Errors surfaced at the configuration and feed boundaries.
///
/// Computation itself never fails: insufficient history is reported as
/// `None`, and degenerate divisors are clamped by each indicator.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Non-positive or nonsensical indicator/line parameter.
    #[error("invalid parameter for {indicator}: {reason}")]
    InvalidParameter {
        indicator: &'static str,
        reason: String,
    },

    /// Appended bar does not strictly follow the last bar.
    #[error("out-of-order bar: timestamp {got} does not follow {last}")]
    OutOfOrderBar { last: Timestamp, got: Timestamp },

    /// Bar violates `low <= min(open, close) <= max(open, close) <= high`
    /// or carries a non-positive price.
    #[error("invalid bar at {timestamp}: {reason}")]
    InvalidBar {
        timestamp: Timestamp,
        reason: &'static str,
    },

    /// Enabling or disabling an indicator that is not configured.
    #[error("indicator {0} is not configured")]
    UnknownIndicator(IndicatorKind),

    #[error("unknown line {0}")]
    UnknownLine(LineId),

    #[error("unknown timeframe {0:?}")]
    UnknownTimeframe(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn invalid(indicator: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            indicator,
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

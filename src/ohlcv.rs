/// Quote currency amount; plain [`f64`] so indicator math stays
/// allocation and conversion free.
pub type Price = f64;

/// Bar open timestamp or sequence number.
///
/// Strictly increasing within a [`BarSeries`](crate::BarSeries).
pub type Timestamp = u64;

/// Traded volume of a bar, in whole units.
pub type Volume = u64;

/// Candle input accepted by every streaming indicator.
///
/// [`Bar`](crate::Bar) implements it, but any candle type can: the streaming
/// indicators accept `&impl Ohlcv` and extract what they need internally.
///
/// # Example
///
/// ```
/// use chartlab_ta::{Ohlcv, Price, Timestamp, Volume};
///
/// struct Candle {
///     prices: [f64; 4],
///     traded: u64,
///     start: u64,
/// }
///
/// impl Ohlcv for Candle {
///     fn open(&self) -> Price { self.prices[0] }
///     fn high(&self) -> Price { self.prices[1] }
///     fn low(&self) -> Price { self.prices[2] }
///     fn close(&self) -> Price { self.prices[3] }
///     fn open_time(&self) -> Timestamp { self.start }
///     fn volume(&self) -> Volume { self.traded }
/// }
/// ```
pub trait Ohlcv {
    fn open(&self) -> Price;

    fn high(&self) -> Price;

    fn low(&self) -> Price;

    /// Last traded price of the period.
    fn close(&self) -> Price;

    /// Start of the period; indicators never read it.
    fn open_time(&self) -> Timestamp;

    /// Defaults to `0` for candle types without volume.
    ///
    /// Only the volume-dependent indicators (VWAP, OBV) read it.
    fn volume(&self) -> Volume {
        0
    }
}

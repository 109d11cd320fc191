use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

/// One normalized OHLCV bucket.
///
/// Field order mirrors the wire tuple `[t, low, high, open, close, volume]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub low: f64,
    pub high: f64,
    pub open: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub const fn new(
        timestamp: i64,
        low: f64,
        high: f64,
        open: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            low,
            high,
            open,
            close,
            volume,
        }
    }

    /// Build a candle from an upstream bar whose time is in epoch milliseconds.
    pub fn from_millis(
        timestamp_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self::new(timestamp_ms.div_euclid(1_000), low, high, open, close, volume)
    }
}

impl Serialize for Candle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(6)?;
        tuple.serialize_element(&self.timestamp)?;
        tuple.serialize_element(&self.low)?;
        tuple.serialize_element(&self.high)?;
        tuple.serialize_element(&self.open)?;
        tuple.serialize_element(&self.close)?;
        tuple.serialize_element(&self.volume)?;
        tuple.end()
    }
}

/// Candles in upstream order (newest first for the aggregates query).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

}

impl FromIterator<Candle> for CandleSeries {
    fn from_iter<I: IntoIterator<Item = Candle>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

//! Core types used throughout the fusion layer
//!
//! Defines market samples, categorical indicator views, composite labels and
//! plot export series.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLCV market sample (open is not needed by any collaborator)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Sample {
    pub fn new(high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            high,
            low,
            close,
            volume,
        }
    }

    /// Typical price: (High + Low + Close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// True range against the previous close (plain range when there is none)
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(pc) => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
            None => hl,
        }
    }

    /// Shape and range predicate shared by every collaborator.
    ///
    /// Returns a human readable reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if !(self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
        {
            return Err("sample contains non-finite values".to_string());
        }
        if self.high < self.low {
            return Err(format!("high {} is below low {}", self.high, self.low));
        }
        if self.close < 0.0 {
            return Err(format!("close {} is negative", self.close));
        }
        if self.volume < 0.0 {
            return Err(format!("volume {} is negative", self.volume));
        }
        Ok(())
    }
}

/// Bias direction a query is evaluated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Bullish => write!(f, "bullish"),
            Bias::Bearish => write!(f, "bearish"),
        }
    }
}

/// Zone classification of a bounded oscillator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Oversold,
    Overbought,
    Neutral,
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Neutral
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Oversold => write!(f, "Oversold"),
            Zone::Overbought => write!(f, "Overbought"),
            Zone::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Trend direction reported by trend-following collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Neutral
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
            Trend::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Price/oscillator divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Divergence {
    Bullish,
    Bearish,
    None,
}

impl Divergence {
    pub fn is_detected(&self) -> bool {
        !matches!(self, Divergence::None)
    }
}

impl Default for Divergence {
    fn default() -> Self {
        Divergence::None
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Divergence::Bullish => write!(f, "bullish"),
            Divergence::Bearish => write!(f, "bearish"),
            Divergence::None => write!(f, "none"),
        }
    }
}

/// Composite label produced by a fusion query, ordered from most bullish to
/// most bearish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompositeSignal {
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
    #[serde(rename = "Bullish")]
    Bullish,
    #[serde(rename = "Weak Bullish")]
    WeakBullish,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Weak Bearish")]
    WeakBearish,
    #[serde(rename = "Bearish")]
    Bearish,
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
}

impl Default for CompositeSignal {
    fn default() -> Self {
        CompositeSignal::Neutral
    }
}

impl CompositeSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeSignal::StrongBullish => "Strong Bullish",
            CompositeSignal::Bullish => "Bullish",
            CompositeSignal::WeakBullish => "Weak Bullish",
            CompositeSignal::Neutral => "Neutral",
            CompositeSignal::WeakBearish => "Weak Bearish",
            CompositeSignal::Bearish => "Bearish",
            CompositeSignal::StrongBearish => "Strong Bearish",
        }
    }

    /// Bias carried by the label, `None` for Neutral
    pub fn bias(&self) -> Option<Bias> {
        match self {
            CompositeSignal::StrongBullish
            | CompositeSignal::Bullish
            | CompositeSignal::WeakBullish => Some(Bias::Bullish),
            CompositeSignal::Neutral => None,
            CompositeSignal::WeakBearish
            | CompositeSignal::Bearish
            | CompositeSignal::StrongBearish => Some(Bias::Bearish),
        }
    }
}

impl fmt::Display for CompositeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rendering hint for an exported series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Line,
    Histogram,
    Scatter,
}

/// One exported plot series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub kind: SeriesKind,
    pub timestamps: Option<Vec<DateTime<Utc>>>,
}

impl PlotSeries {
    /// Build a series whose x values are absolute sample indices.
    ///
    /// `first_index` is the index of `values[0]` in the full sample stream;
    /// timestamps are `start + interval * index`, or `None` when any of them
    /// falls outside the representable range.
    pub fn from_values<'a, I>(
        name: impl Into<String>,
        kind: SeriesKind,
        first_index: usize,
        values: I,
        start: DateTime<Utc>,
        interval: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let y: Vec<f64> = values.into_iter().copied().collect();
        let x: Vec<f64> = (0..y.len()).map(|i| (first_index + i) as f64).collect();
        let timestamps = (first_index..first_index + y.len())
            .map(|idx| {
                let steps = i32::try_from(idx).ok()?;
                interval
                    .checked_mul(steps)
                    .and_then(|offset| start.checked_add_signed(offset))
            })
            .collect();

        Self {
            name: name.into(),
            x,
            y,
            kind,
            timestamps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

//! Indicator collaborators - streaming technical indicators
//!
//! Each collaborator consumes one [`Sample`] at a time and keeps its own
//! bounded rolling state. The fusion layer only talks to them through the
//! capability traits below, one trait per query kind:
//! - [`Indicator`]: ingestion, reset, readiness and plot export (everyone)
//! - [`CrossoverSignal`]: fallible bullish/bearish crossover events
//! - [`ZoneSignal`]: oversold/overbought classification
//! - [`TrendSignal`]: trend direction
//! - [`DivergenceSignal`]: price/oscillator divergence
//!
//! Not every collaborator implements every capability. ATSO, for instance,
//! only exposes an infallible raw sign-change check.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use crate::error::IndicatorError;
use crate::types::{Divergence, PlotSeries, Sample, Trend, Zone};

pub mod amdo;
pub mod atr;
pub mod atso;
pub mod bollinger;
pub mod cci;
pub mod hma;
pub mod macd;
pub mod mfi;
pub mod rsi;
pub mod sar;
pub mod stochastic;
pub mod vwao;
pub mod vwap;

pub use amdo::Amdo;
pub use atr::Atr;
pub use atso::Atso;
pub use bollinger::{Bands, Bollinger};
pub use cci::Cci;
pub use hma::Hma;
pub use macd::Macd;
pub use mfi::Mfi;
pub use rsi::Rsi;
pub use sar::ParabolicSar;
pub use stochastic::Stochastic;
pub use vwao::Vwao;
pub use vwap::Vwap;

/// Maximum number of derived values kept per series
pub const MAX_HISTORY: usize = 500;

/// Base capability shared by every collaborator
pub trait Indicator {
    /// Identity used in errors, plot series and divergence reports
    fn name(&self) -> &'static str;

    /// Ingest one sample
    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError>;

    /// Drop all rolling state, as if freshly constructed
    fn reset(&mut self);

    /// True once enough history exists to produce a value
    fn is_ready(&self) -> bool;

    /// Export the retained value history; empty when not ready
    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries>;
}

/// Crossover events between the previous and the current step
pub trait CrossoverSignal {
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError>;
    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError>;
}

pub trait ZoneSignal {
    fn zone(&self) -> Zone;
}

pub trait TrendSignal {
    fn trend(&self) -> Trend;
}

pub trait DivergenceSignal {
    fn divergence(&self) -> Result<Divergence, IndicatorError>;
}

// ============================================================================
// Shared rolling state
// ============================================================================

/// Bounded value history that remembers which sample its first value belongs to
#[derive(Debug, Clone, PartialEq, Default)]
pub struct History {
    values: VecDeque<f64>,
    first_index: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the value derived from sample number `index`
    pub fn push(&mut self, index: usize, value: f64) {
        if self.values.is_empty() {
            self.first_index = index;
        }
        self.values.push_back(value);
        while self.values.len() > MAX_HISTORY {
            self.values.pop_front();
            self.first_index += 1;
        }
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Value one step before the latest
    pub fn previous(&self) -> Option<f64> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        self.values.get(n - 2).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_index(&self) -> usize {
        self.first_index
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// The most recent `n` values, oldest first
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &f64> {
        self.values.iter().skip(self.values.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.first_index = 0;
    }

    /// Latest two values, checked for finiteness.
    ///
    /// `Ok(None)` while fewer than two values exist.
    pub fn last_pair(&self, what: &'static str) -> Result<Option<(f64, f64)>, IndicatorError> {
        match (self.previous(), self.last()) {
            (Some(prev), Some(cur)) => {
                ensure_finite(what, prev)?;
                ensure_finite(what, cur)?;
                Ok(Some((prev, cur)))
            }
            _ => Ok(None),
        }
    }

    pub fn to_series(
        &self,
        name: &str,
        kind: crate::types::SeriesKind,
        start: DateTime<Utc>,
        interval: Duration,
    ) -> PlotSeries {
        PlotSeries::from_values(name, kind, self.first_index, self.values.iter(), start, interval)
    }
}

/// Exponential moving average seeded with the simple average of the first
/// `period` inputs
#[derive(Debug, Clone, PartialEq)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        if let Some(prev) = self.value {
            let next = prev + self.alpha * (x - prev);
            self.value = Some(next);
            return self.value;
        }
        self.seed_sum += x;
        self.seen += 1;
        if self.seen >= self.period {
            self.value = Some(self.seed_sum / self.period as f64);
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.seed_sum = 0.0;
        self.seen = 0;
        self.value = None;
    }
}

/// Linearly weighted moving average (newest value has weight `period`)
#[derive(Debug, Clone, PartialEq)]
pub struct Wma {
    period: usize,
    window: VecDeque<f64>,
}

impl Wma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period),
        }
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        push_bounded(&mut self.window, x, self.period);
        if self.window.len() < self.period {
            return None;
        }
        let denom = (self.period * (self.period + 1)) as f64 / 2.0;
        let weighted: f64 = self
            .window
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1) as f64 * v)
            .sum();
        Some(weighted / denom)
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// Push onto a window, dropping the oldest entries beyond `cap`
pub fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, cap: usize) {
    buf.push_back(value);
    while buf.len() > cap {
        buf.pop_front();
    }
}

/// `a` moved from at-or-below `b` to strictly above it
pub fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a <= prev_b && a > b
}

/// `a` moved from at-or-above `b` to strictly below it
pub fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a >= prev_b && a < b
}

pub fn ensure_finite(what: &'static str, value: f64) -> Result<f64, IndicatorError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndicatorError::NonFinite { what })
    }
}

pub fn ensure_period(name: &str, period: usize) -> Result<usize, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::invalid_parameter(name, "must be greater than 0"));
    }
    Ok(period)
}

/// Validate a sample on behalf of a collaborator
pub fn check_sample(sample: &Sample) -> Result<(), IndicatorError> {
    sample.check().map_err(IndicatorError::InvalidSample)
}

/// Classify a bounded oscillator value against its bands
pub fn classify_zone(value: Option<f64>, oversold: f64, overbought: f64) -> Zone {
    match value {
        Some(v) if v <= oversold => Zone::Oversold,
        Some(v) if v >= overbought => Zone::Overbought,
        _ => Zone::Neutral,
    }
}

/// Regular divergence over the last `lookback` aligned points.
///
/// Bullish: the latest close is strictly below every earlier close in the
/// window while the oscillator is strictly above its earlier minimum.
/// Bearish is the mirror image. Fewer than `lookback` points yields `None`.
pub fn detect_divergence(
    closes: &History,
    values: &History,
    lookback: usize,
) -> Result<Divergence, IndicatorError> {
    let lookback = lookback.max(2);
    if closes.len() < lookback || values.len() < lookback {
        return Ok(Divergence::None);
    }

    let prices: Vec<f64> = closes.tail(lookback).copied().collect();
    let osc: Vec<f64> = values.tail(lookback).copied().collect();
    for v in &osc {
        ensure_finite("oscillator value", *v)?;
    }

    let (price_now, price_before) = prices.split_last().ok_or(IndicatorError::NonFinite {
        what: "price window",
    })?;
    let (osc_now, osc_before) = osc.split_last().ok_or(IndicatorError::NonFinite {
        what: "oscillator window",
    })?;

    let min_price = price_before.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_price = price_before.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_osc = osc_before.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_osc = osc_before.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if *price_now < min_price && *osc_now > min_osc {
        return Ok(Divergence::Bullish);
    }
    if *price_now > max_price && *osc_now < max_osc {
        return Ok(Divergence::Bearish);
    }
    Ok(Divergence::None)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::Sample;

    /// Deterministic oscillating price path with a slow drift
    pub fn wave(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 100.0 + 5.0 * (t / 6.0).sin() + 0.05 * t;
                Sample::new(close + 1.0, close - 1.0, close, 1000.0 + 10.0 * (t % 7.0))
            })
            .collect()
    }

    pub fn flat(close: f64) -> Sample {
        Sample::new(close + 0.5, close - 0.5, close, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeds_with_sma() {
        let mut ema = Ema::new(3);
        assert_eq!(ema.update(1.0), None);
        assert_eq!(ema.update(2.0), None);
        assert_eq!(ema.update(3.0), Some(2.0));
        // alpha = 0.5
        assert_eq!(ema.update(4.0), Some(3.0));
        ema.reset();
        assert_eq!(ema.value(), None);
    }

    #[test]
    fn test_wma_weights_newest_highest() {
        let mut wma = Wma::new(3);
        wma.update(1.0);
        wma.update(2.0);
        // (1*1 + 2*2 + 3*3) / 6
        let v = wma.update(3.0).unwrap();
        assert!((v - 14.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_history_tracks_first_index() {
        let mut h = History::new();
        for i in 0..(MAX_HISTORY + 5) {
            h.push(i + 3, i as f64);
        }
        assert_eq!(h.len(), MAX_HISTORY);
        assert_eq!(h.first_index(), 8);
        assert_eq!(h.last(), Some((MAX_HISTORY + 4) as f64));
        assert_eq!(h.previous(), Some((MAX_HISTORY + 3) as f64));
    }

    #[test]
    fn test_last_pair_rejects_non_finite() {
        let mut h = History::new();
        assert_eq!(h.last_pair("x").unwrap(), None);
        h.push(0, 1.0);
        h.push(1, f64::NAN);
        assert!(h.last_pair("x").is_err());
    }

    #[test]
    fn test_crossings() {
        assert!(crossed_above(29.0, 30.0, 31.0, 30.0));
        assert!(crossed_above(30.0, 30.0, 30.5, 30.0));
        assert!(!crossed_above(31.0, 30.0, 32.0, 30.0));
        assert!(crossed_below(71.0, 70.0, 69.0, 70.0));
        assert!(!crossed_below(69.0, 70.0, 68.0, 70.0));
    }

    #[test]
    fn test_bullish_divergence() {
        let mut closes = History::new();
        let mut osc = History::new();
        // Price makes a lower low, oscillator holds above its prior low
        let prices = [100.0, 98.0, 96.0, 97.0, 95.0];
        let values = [50.0, 40.0, 30.0, 35.0, 33.0];
        for (i, (p, v)) in prices.iter().zip(values.iter()).enumerate() {
            closes.push(i, *p);
            osc.push(i, *v);
        }
        assert_eq!(detect_divergence(&closes, &osc, 5).unwrap(), Divergence::Bullish);
    }

    #[test]
    fn test_bearish_divergence() {
        let mut closes = History::new();
        let mut osc = History::new();
        let prices = [100.0, 102.0, 104.0, 103.0, 105.0];
        let values = [50.0, 60.0, 70.0, 65.0, 66.0];
        for (i, (p, v)) in prices.iter().zip(values.iter()).enumerate() {
            closes.push(i, *p);
            osc.push(i, *v);
        }
        assert_eq!(detect_divergence(&closes, &osc, 5).unwrap(), Divergence::Bearish);
    }

    #[test]
    fn test_divergence_needs_full_window() {
        let mut closes = History::new();
        let mut osc = History::new();
        closes.push(0, 1.0);
        osc.push(0, 1.0);
        assert_eq!(detect_divergence(&closes, &osc, 5).unwrap(), Divergence::None);
    }

    #[test]
    fn test_classify_zone() {
        assert_eq!(classify_zone(Some(25.0), 30.0, 70.0), Zone::Oversold);
        assert_eq!(classify_zone(Some(75.0), 30.0, 70.0), Zone::Overbought);
        assert_eq!(classify_zone(Some(50.0), 30.0, 70.0), Zone::Neutral);
        assert_eq!(classify_zone(None, 30.0, 70.0), Zone::Neutral);
    }
}

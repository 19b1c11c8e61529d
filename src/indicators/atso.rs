//! Adaptive Trend Strength Oscillator
//!
//! Spread between a fast and a slow EMA of closes, normalised by the average
//! bar range so the reading is comparable across volatility regimes. Only the
//! raw value and its sign changes are exposed; there is no fallible query.

use chrono::{DateTime, Duration, Utc};

use super::{check_sample, ensure_period, Ema, History, Indicator};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Atso {
    fast: Ema,
    slow: Ema,
    range: Ema,
    samples: usize,
    values: History,
}

impl Atso {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, IndicatorError> {
        ensure_period("fast_period", fast_period)?;
        ensure_period("slow_period", slow_period)?;
        if fast_period >= slow_period {
            return Err(IndicatorError::invalid_parameter(
                "fast_period",
                format!("fast period {fast_period} must be below slow period {slow_period}"),
            ));
        }

        Ok(Self {
            fast: Ema::new(fast_period),
            slow: Ema::new(slow_period),
            range: Ema::new(slow_period),
            samples: 0,
            values: History::new(),
        })
    }

    /// Latest raw oscillator reading
    pub fn raw_value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn previous_raw_value(&self) -> Option<f64> {
        self.values.previous()
    }

    /// Raw value flipped from non-positive to positive on the latest step
    pub fn crossed_above_zero(&self) -> bool {
        match (self.previous_raw_value(), self.raw_value()) {
            (Some(prev), Some(cur)) => prev <= 0.0 && cur > 0.0,
            _ => false,
        }
    }

    /// Raw value flipped from non-negative to negative on the latest step
    pub fn crossed_below_zero(&self) -> bool {
        match (self.previous_raw_value(), self.raw_value()) {
            (Some(prev), Some(cur)) => prev >= 0.0 && cur < 0.0,
            _ => false,
        }
    }
}

impl Indicator for Atso {
    fn name(&self) -> &'static str {
        "ATSO"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;

        let fast = self.fast.update(sample.close);
        let slow = self.slow.update(sample.close);
        let range = self.range.update(sample.high - sample.low);

        if let (Some(fast), Some(slow), Some(range)) = (fast, slow, range) {
            let raw = if range > 1e-12 {
                (fast - slow) / range
            } else {
                0.0
            };
            self.values.push(index, raw);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.range.reset();
        self.samples = 0;
        self.values.clear();
    }

    fn is_ready(&self) -> bool {
        !self.values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        if self.values.is_empty() {
            return Vec::new();
        }
        vec![self.values.to_series("ATSO", SeriesKind::Histogram, start, interval)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_atso_sign_change() {
        let mut atso = Atso::new(2, 4).unwrap();
        for c in [110.0, 108.0, 106.0, 104.0, 102.0] {
            atso.add(&flat(c)).unwrap();
        }
        assert!(atso.raw_value().unwrap() < 0.0);
        assert!(!atso.crossed_above_zero());

        let mut flipped = false;
        for c in [112.0, 120.0, 128.0] {
            atso.add(&flat(c)).unwrap();
            flipped |= atso.crossed_above_zero();
        }
        assert!(flipped);
        assert!(atso.raw_value().unwrap() > 0.0);
    }

    #[test]
    fn test_atso_flat_market_is_zero() {
        let mut atso = Atso::new(2, 4).unwrap();
        for _ in 0..6 {
            atso.add(&Sample::new(100.0, 100.0, 100.0, 1.0)).unwrap();
        }
        assert_eq!(atso.raw_value(), Some(0.0));
        assert!(!atso.crossed_above_zero());
        assert!(!atso.crossed_below_zero());
    }
}

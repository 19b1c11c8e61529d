//! Session VWAP - cumulative typical price weighted by volume

use chrono::{DateTime, Duration, Utc};

use super::{check_sample, History, Indicator};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

/// Cumulative from the first sample (or the last reset)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vwap {
    price_volume: f64,
    volume: f64,
    typical_sum: f64,
    samples: usize,
    values: History,
}

impl Vwap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &'static str {
        "VWAP"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;

        let tp = sample.typical_price();
        self.price_volume += tp * sample.volume;
        self.volume += sample.volume;
        self.typical_sum += tp;

        // Zero cumulative volume falls back to the plain typical-price mean
        let vwap = if self.volume > 0.0 {
            self.price_volume / self.volume
        } else {
            self.typical_sum / self.samples as f64
        };
        self.values.push(index, vwap);
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_ready(&self) -> bool {
        !self.values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        if self.values.is_empty() {
            return Vec::new();
        }
        vec![self.values.to_series("VWAP", SeriesKind::Line, start, interval)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vwap_weights_by_volume() {
        let mut vwap = Vwap::new();
        vwap.add(&Sample::new(10.0, 10.0, 10.0, 1.0)).unwrap();
        vwap.add(&Sample::new(20.0, 20.0, 20.0, 3.0)).unwrap();
        assert_eq!(vwap.value(), Some(17.5));
    }

    #[test]
    fn test_vwap_zero_volume_uses_mean() {
        let mut vwap = Vwap::new();
        vwap.add(&Sample::new(10.0, 10.0, 10.0, 0.0)).unwrap();
        vwap.add(&Sample::new(20.0, 20.0, 20.0, 0.0)).unwrap();
        assert_eq!(vwap.value(), Some(15.0));
    }

    #[test]
    fn test_vwap_rejects_inverted_sample() {
        let mut vwap = Vwap::new();
        assert!(vwap.add(&Sample::new(9.0, 10.0, 9.5, 1.0)).is_err());
        assert!(!vwap.is_ready());
    }
}

//! Bollinger Bands - SMA of closes +/- k population standard deviations

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use super::{check_sample, ensure_period, push_bounded, History, Indicator};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    closes: VecDeque<f64>,
    samples: usize,
    upper: History,
    middle: History,
    lower: History,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(IndicatorError::invalid_parameter(
                "multiplier",
                "must be a positive number",
            ));
        }

        Ok(Self {
            period,
            multiplier,
            closes: VecDeque::with_capacity(period),
            samples: 0,
            upper: History::new(),
            middle: History::new(),
            lower: History::new(),
        })
    }

    pub fn bands(&self) -> Option<Bands> {
        Some(Bands {
            upper: self.upper.last()?,
            middle: self.middle.last()?,
            lower: self.lower.last()?,
        })
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &'static str {
        "Bollinger"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        push_bounded(&mut self.closes, sample.close, self.period);

        if self.closes.len() >= self.period {
            let n = self.period as f64;
            let mean = self.closes.iter().sum::<f64>() / n;
            let variance = self.closes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
            let offset = self.multiplier * variance.sqrt();

            self.upper.push(index, mean + offset);
            self.middle.push(index, mean);
            self.lower.push(index, mean - offset);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.closes.clear();
        self.samples = 0;
        self.upper.clear();
        self.middle.clear();
        self.lower.clear();
    }

    fn is_ready(&self) -> bool {
        !self.middle.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        if self.middle.is_empty() {
            return Vec::new();
        }
        vec![
            self.upper.to_series("Bollinger Upper", SeriesKind::Line, start, interval),
            self.middle.to_series("Bollinger Middle", SeriesKind::Line, start, interval),
            self.lower.to_series("Bollinger Lower", SeriesKind::Line, start, interval),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_bollinger_known_values() {
        let mut bb = Bollinger::new(4, 2.0).unwrap();
        for c in [2.0, 4.0, 4.0, 6.0] {
            bb.add(&flat(c)).unwrap();
        }
        // mean 4, population variance 2
        let bands = bb.bands().unwrap();
        assert_eq!(bands.middle, 4.0);
        assert!((bands.upper - (4.0 + 2.0 * 2f64.sqrt())).abs() < 1e-12);
        assert!((bands.lower - (4.0 - 2.0 * 2f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_flat_collapses() {
        let mut bb = Bollinger::new(3, 2.0).unwrap();
        for _ in 0..3 {
            bb.add(&flat(50.0)).unwrap();
        }
        let bands = bb.bands().unwrap();
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.middle, 50.0);
    }

    #[test]
    fn test_bollinger_plot_names() {
        let mut bb = Bollinger::new(2, 2.0).unwrap();
        assert!(bb.plot_data(Utc::now(), Duration::minutes(1)).is_empty());
        bb.add(&flat(1.0)).unwrap();
        bb.add(&flat(2.0)).unwrap();
        let names: Vec<String> = bb
            .plot_data(Utc::now(), Duration::minutes(1))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Bollinger Upper", "Bollinger Middle", "Bollinger Lower"]);
    }

    #[test]
    fn test_bollinger_rejects_bad_multiplier() {
        assert!(Bollinger::new(20, 0.0).is_err());
        assert!(Bollinger::new(20, f64::NAN).is_err());
    }
}

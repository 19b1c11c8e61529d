//! Average True Range (Wilder smoothing)

use chrono::{DateTime, Duration, Utc};

use super::{check_sample, ensure_period, History, Indicator};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seen: usize,
    samples: usize,
    values: History,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            seen: 0,
            samples: 0,
            values: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn previous(&self) -> Option<f64> {
        self.values.previous()
    }
}

impl Indicator for Atr {
    fn name(&self) -> &'static str {
        "ATR"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        let tr = sample.true_range(self.prev_close);
        self.prev_close = Some(sample.close);

        match self.values.last() {
            Some(prev) => {
                let n = self.period as f64;
                self.values.push(index, (prev * (n - 1.0) + tr) / n);
            }
            None => {
                self.seed_sum += tr;
                self.seen += 1;
                if self.seen >= self.period {
                    self.values.push(index, self.seed_sum / self.period as f64);
                }
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.seed_sum = 0.0;
        self.seen = 0;
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
        vec![self.values.to_series("ATR", SeriesKind::Line, start, interval)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_atr_constant_range() {
        let mut atr = Atr::new(3).unwrap();
        for _ in 0..5 {
            atr.add(&flat(100.0)).unwrap();
        }
        assert_eq!(atr.value(), Some(1.0));
        assert_eq!(atr.previous(), Some(1.0));
    }

    #[test]
    fn test_atr_includes_gaps() {
        let mut atr = Atr::new(2).unwrap();
        atr.add(&flat(100.0)).unwrap();
        // Gap up: true range spans from the prior close
        atr.add(&flat(110.0)).unwrap();
        assert_eq!(atr.value(), Some((1.0 + 10.5) / 2.0));
    }

    #[test]
    fn test_atr_reset() {
        let mut atr = Atr::new(2).unwrap();
        atr.add(&flat(100.0)).unwrap();
        atr.add(&flat(101.0)).unwrap();
        atr.reset();
        assert_eq!(atr, Atr::new(2).unwrap());
    }
}

//! Commodity Channel Index

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::{
    check_sample, crossed_above, crossed_below, ensure_period, push_bounded, CrossoverSignal,
    History, Indicator,
};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

const CCI_CONSTANT: f64 = 0.015;
const CCI_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Cci {
    period: usize,
    typical: VecDeque<f64>,
    samples: usize,
    values: History,
}

impl Cci {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        Ok(Self {
            period,
            typical: VecDeque::with_capacity(period),
            samples: 0,
            values: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }
}

impl Indicator for Cci {
    fn name(&self) -> &'static str {
        "CCI"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        let tp = sample.typical_price();
        push_bounded(&mut self.typical, tp, self.period);

        if self.typical.len() >= self.period {
            let n = self.period as f64;
            let mean = self.typical.iter().sum::<f64>() / n;
            let mean_dev = self.typical.iter().map(|v| (v - mean).abs()).sum::<f64>() / n;
            let cci = if mean_dev > 1e-12 {
                (tp - mean) / (CCI_CONSTANT * mean_dev)
            } else {
                0.0
            };
            self.values.push(index, cci);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.typical.clear();
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
        vec![self.values.to_series("CCI", SeriesKind::Line, start, interval)]
    }
}

impl CrossoverSignal for Cci {
    /// Rose back through -100
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("CCI")? {
            Some((prev, cur)) => crossed_above(prev, -CCI_LEVEL, cur, -CCI_LEVEL),
            None => false,
        })
    }

    /// Fell back through +100
    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("CCI")? {
            Some((prev, cur)) => crossed_below(prev, CCI_LEVEL, cur, CCI_LEVEL),
            None => false,
        })
    }
}

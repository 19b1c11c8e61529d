//! Volume-Weighted Average Oscillator
//!
//! Percentage spread between a fast and a slow volume-weighted moving average
//! of closes. Zero-line crossings are the crossover events.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::{
    check_sample, crossed_above, crossed_below, ensure_period, push_bounded, CrossoverSignal,
    History, Indicator,
};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Vwao {
    fast_period: usize,
    slow_period: usize,
    /// (close, volume), newest last
    window: VecDeque<(f64, f64)>,
    samples: usize,
    values: History,
}

impl Vwao {
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
            fast_period,
            slow_period,
            window: VecDeque::with_capacity(slow_period),
            samples: 0,
            values: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    /// VWMA of the newest `n` entries; plain mean when no volume traded
    fn vwma(&self, n: usize) -> f64 {
        let recent = self.window.iter().skip(self.window.len() - n);
        let (pv, vol, sum) = recent.fold((0.0, 0.0, 0.0), |(pv, vol, sum), (c, v)| {
            (pv + c * v, vol + v, sum + c)
        });
        if vol > 0.0 {
            pv / vol
        } else {
            sum / n as f64
        }
    }
}

impl Indicator for Vwao {
    fn name(&self) -> &'static str {
        "VWAO"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        push_bounded(&mut self.window, (sample.close, sample.volume), self.slow_period);

        if self.window.len() >= self.slow_period {
            let fast = self.vwma(self.fast_period);
            let slow = self.vwma(self.slow_period);
            let osc = if slow.abs() > 1e-12 {
                (fast - slow) / slow * 100.0
            } else {
                0.0
            };
            self.values.push(index, osc);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.window.clear();
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
        vec![self.values.to_series("VWAO", SeriesKind::Histogram, start, interval)]
    }
}

impl CrossoverSignal for Vwao {
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("VWAO")? {
            Some((prev, cur)) => crossed_above(prev, 0.0, cur, 0.0),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("VWAO")? {
            Some((prev, cur)) => crossed_below(prev, 0.0, cur, 0.0),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_vwao_sign_follows_trend() {
        let mut vwao = Vwao::new(3, 6).unwrap();
        for i in 0..10 {
            vwao.add(&flat(100.0 + i as f64)).unwrap();
        }
        assert!(vwao.value().unwrap() > 0.0);
    }

    #[test]
    fn test_vwao_zero_line_crossover() {
        let mut vwao = Vwao::new(2, 4).unwrap();
        for c in [110.0, 108.0, 106.0, 104.0, 102.0] {
            vwao.add(&flat(c)).unwrap();
        }
        assert!(vwao.value().unwrap() < 0.0);
        vwao.add(&flat(120.0)).unwrap();
        vwao.add(&flat(125.0)).unwrap();
        assert!(vwao.value().unwrap() > 0.0);
        // Crossing happened on exactly one of the last two steps
        let mut fresh = Vwao::new(2, 4).unwrap();
        let mut crossings = 0;
        for c in [110.0, 108.0, 106.0, 104.0, 102.0, 120.0, 125.0] {
            fresh.add(&flat(c)).unwrap();
            if fresh.is_bullish_crossover().unwrap() {
                crossings += 1;
            }
        }
        assert_eq!(crossings, 1);
    }

    #[test]
    fn test_vwao_rejects_inverted_periods() {
        assert!(Vwao::new(10, 5).is_err());
        assert!(Vwao::new(0, 5).is_err());
    }
}

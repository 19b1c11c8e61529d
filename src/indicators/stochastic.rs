//! Stochastic oscillator (%K / %D)

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::rsi::check_bands;
use super::{
    check_sample, classify_zone, crossed_above, crossed_below, ensure_period, push_bounded,
    CrossoverSignal, History, Indicator, ZoneSignal,
};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind, Zone};

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    overbought: f64,
    oversold: f64,
    highs: VecDeque<f64>,
    lows: VecDeque<f64>,
    recent_k: VecDeque<f64>,
    samples: usize,
    k_values: History,
    d_values: History,
}

impl Stochastic {
    pub fn new(
        k_period: usize,
        d_period: usize,
        overbought: f64,
        oversold: f64,
    ) -> Result<Self, IndicatorError> {
        ensure_period("k_period", k_period)?;
        ensure_period("d_period", d_period)?;
        check_bands(oversold, overbought)?;

        Ok(Self {
            k_period,
            d_period,
            overbought,
            oversold,
            highs: VecDeque::with_capacity(k_period),
            lows: VecDeque::with_capacity(k_period),
            recent_k: VecDeque::with_capacity(d_period),
            samples: 0,
            k_values: History::new(),
            d_values: History::new(),
        })
    }

    /// Latest %K
    pub fn k(&self) -> Option<f64> {
        self.k_values.last()
    }

    /// Latest %D
    pub fn d(&self) -> Option<f64> {
        self.d_values.last()
    }

    fn crossing_points(&self) -> Result<Option<(f64, f64, f64, f64)>, IndicatorError> {
        let k = self.k_values.last_pair("%K")?;
        let d = self.d_values.last_pair("%D")?;
        Ok(match (k, d) {
            (Some((pk, k)), Some((pd, d))) => Some((pk, pd, k, d)),
            _ => None,
        })
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &'static str {
        "Stochastic"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        push_bounded(&mut self.highs, sample.high, self.k_period);
        push_bounded(&mut self.lows, sample.low, self.k_period);

        if self.highs.len() < self.k_period {
            return Ok(());
        }

        let highest = self.highs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let lowest = self.lows.iter().cloned().fold(f64::INFINITY, f64::min);
        let range = highest - lowest;
        let k = if range > 1e-12 {
            (sample.close - lowest) / range * 100.0
        } else {
            50.0
        };
        self.k_values.push(index, k);

        push_bounded(&mut self.recent_k, k, self.d_period);
        if self.recent_k.len() >= self.d_period {
            let d = self.recent_k.iter().sum::<f64>() / self.d_period as f64;
            self.d_values.push(index, d);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.recent_k.clear();
        self.samples = 0;
        self.k_values.clear();
        self.d_values.clear();
    }

    fn is_ready(&self) -> bool {
        !self.d_values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        let mut series = Vec::new();
        if !self.k_values.is_empty() {
            series.push(self.k_values.to_series("Stochastic %K", SeriesKind::Line, start, interval));
        }
        if !self.d_values.is_empty() {
            series.push(self.d_values.to_series("Stochastic %D", SeriesKind::Line, start, interval));
        }
        series
    }
}

impl CrossoverSignal for Stochastic {
    /// %K crossed above %D
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((pk, pd, k, d)) => crossed_above(pk, pd, k, d),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((pk, pd, k, d)) => crossed_below(pk, pd, k, d),
            None => false,
        })
    }
}

impl ZoneSignal for Stochastic {
    fn zone(&self) -> Zone {
        classify_zone(self.k(), self.oversold, self.overbought)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stochastic_close_at_high_is_100() {
        let mut stoch = Stochastic::new(3, 2, 80.0, 20.0).unwrap();
        for c in [100.0, 101.0, 102.0] {
            stoch.add(&Sample::new(c, c - 2.0, c, 10.0)).unwrap();
        }
        assert_eq!(stoch.k(), Some(100.0));
        assert_eq!(stoch.zone(), Zone::Overbought);
        assert!(!stoch.is_ready());
    }

    #[test]
    fn test_stochastic_k_crosses_d() {
        let mut stoch = Stochastic::new(3, 2, 80.0, 20.0).unwrap();
        // Closes at the lows, then a close at the top of the range
        for c in [100.0, 99.0, 98.0, 97.0] {
            stoch.add(&Sample::new(c + 2.0, c, c, 10.0)).unwrap();
        }
        assert_eq!(stoch.k(), Some(0.0));
        assert_eq!(stoch.zone(), Zone::Oversold);
        stoch.add(&Sample::new(101.0, 99.0, 101.0, 10.0)).unwrap();
        assert!(stoch.k().unwrap() > stoch.d().unwrap());
        assert!(stoch.is_bullish_crossover().unwrap());
    }
}

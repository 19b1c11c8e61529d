//! Adaptive Momentum Divergence Oscillator
//!
//! Percentage momentum over `period` bars, scaled by Kaufman's efficiency
//! ratio so choppy stretches are damped, smoothed by an EMA. A second EMA of
//! the oscillator acts as the signal line; crossovers are oscillator vs signal.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::{
    check_sample, crossed_above, crossed_below, detect_divergence, ensure_period, push_bounded,
    CrossoverSignal, DivergenceSignal, Ema, History, Indicator,
};
use crate::error::IndicatorError;
use crate::types::{Divergence, PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Amdo {
    period: usize,
    divergence_lookback: usize,
    window: VecDeque<f64>,
    smoothing: Ema,
    signal: Ema,
    samples: usize,
    closes: History,
    values: History,
    signals: History,
}

impl Amdo {
    pub fn new(
        period: usize,
        smoothing_period: usize,
        signal_period: usize,
        divergence_lookback: usize,
    ) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        ensure_period("smoothing_period", smoothing_period)?;
        ensure_period("signal_period", signal_period)?;
        ensure_period("divergence_lookback", divergence_lookback)?;

        Ok(Self {
            period,
            divergence_lookback,
            window: VecDeque::with_capacity(period + 1),
            smoothing: Ema::new(smoothing_period),
            signal: Ema::new(signal_period),
            samples: 0,
            closes: History::new(),
            values: History::new(),
            signals: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn signal_value(&self) -> Option<f64> {
        self.signals.last()
    }

    /// Efficiency ratio of the current window, in [0, 1]
    fn efficiency_ratio(&self) -> f64 {
        let (first, last) = match (self.window.front(), self.window.back()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return 0.0,
        };
        let path: f64 = self
            .window
            .iter()
            .zip(self.window.iter().skip(1))
            .map(|(a, b)| (b - a).abs())
            .sum();
        if path < 1e-12 {
            return 0.0;
        }
        (last - first).abs() / path
    }

    fn crossing_points(&self) -> Result<Option<(f64, f64, f64, f64)>, IndicatorError> {
        let osc = self.values.last_pair("AMDO")?;
        let sig = self.signals.last_pair("AMDO signal")?;
        Ok(match (osc, sig) {
            (Some((po, o)), Some((ps, s))) => Some((po, ps, o, s)),
            _ => None,
        })
    }
}

impl Indicator for Amdo {
    fn name(&self) -> &'static str {
        "AMDO"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        self.closes.push(index, sample.close);
        push_bounded(&mut self.window, sample.close, self.period + 1);

        if self.window.len() <= self.period {
            return Ok(());
        }

        let base = self.window.front().copied().unwrap_or(sample.close);
        let momentum = if base.abs() > 1e-12 {
            (sample.close - base) / base * 100.0
        } else {
            0.0
        };
        let raw = momentum * self.efficiency_ratio();

        if let Some(osc) = self.smoothing.update(raw) {
            self.values.push(index, osc);
            if let Some(sig) = self.signal.update(osc) {
                self.signals.push(index, sig);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.window.clear();
        self.smoothing.reset();
        self.signal.reset();
        self.samples = 0;
        self.closes.clear();
        self.values.clear();
        self.signals.clear();
    }

    fn is_ready(&self) -> bool {
        !self.values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        let mut series = Vec::new();
        if !self.values.is_empty() {
            series.push(self.values.to_series("AMDO", SeriesKind::Line, start, interval));
        }
        if !self.signals.is_empty() {
            series.push(self.signals.to_series("AMDO Signal", SeriesKind::Line, start, interval));
        }
        series
    }
}

impl CrossoverSignal for Amdo {
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((po, ps, o, s)) => crossed_above(po, ps, o, s),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((po, ps, o, s)) => crossed_below(po, ps, o, s),
            None => false,
        })
    }
}

impl DivergenceSignal for Amdo {
    fn divergence(&self) -> Result<Divergence, IndicatorError> {
        detect_divergence(&self.closes, &self.values, self.divergence_lookback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{flat, wave};

    #[test]
    fn test_amdo_straight_line_is_full_momentum() {
        let mut amdo = Amdo::new(4, 1, 3, 14).unwrap();
        for i in 0..5 {
            amdo.add(&flat(100.0 + i as f64)).unwrap();
        }
        // ER = 1 on a straight line, so oscillator = plain % momentum
        assert!((amdo.value().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_amdo_choppy_is_damped() {
        let mut amdo = Amdo::new(4, 1, 3, 14).unwrap();
        for c in [100.0, 104.0, 100.0, 104.0, 101.0] {
            amdo.add(&flat(c)).unwrap();
        }
        // 1% momentum, ER = 1 / 15
        assert!((amdo.value().unwrap() - 1.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_amdo_signal_crossovers_alternate() {
        let mut amdo = Amdo::new(5, 2, 3, 14).unwrap();
        let mut bullish = 0;
        let mut bearish = 0;
        for s in wave(120) {
            amdo.add(&s).unwrap();
            if amdo.is_bullish_crossover().unwrap() {
                bullish += 1;
            }
            if amdo.is_bearish_crossover().unwrap() {
                bearish += 1;
            }
        }
        assert!(bullish > 0);
        assert!(bearish > 0);
        assert!((bullish as i32 - bearish as i32).abs() <= 1);
    }
}

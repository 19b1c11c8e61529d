//! MACD with an EMA signal line

use chrono::{DateTime, Duration, Utc};

use super::{
    check_sample, crossed_above, crossed_below, detect_divergence, ensure_period,
    CrossoverSignal, DivergenceSignal, Ema, History, Indicator, TrendSignal,
};
use crate::error::IndicatorError;
use crate::types::{Divergence, PlotSeries, Sample, SeriesKind, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    divergence_lookback: usize,
    samples: usize,
    closes: History,
    macd_values: History,
    signal_values: History,
    histogram: History,
}

impl Macd {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
        divergence_lookback: usize,
    ) -> Result<Self, IndicatorError> {
        ensure_period("fast_period", fast_period)?;
        ensure_period("slow_period", slow_period)?;
        ensure_period("signal_period", signal_period)?;
        ensure_period("divergence_lookback", divergence_lookback)?;
        if fast_period >= slow_period {
            return Err(IndicatorError::invalid_parameter(
                "fast_period",
                format!("fast period {fast_period} must be below slow period {slow_period}"),
            ));
        }

        Ok(Self {
            fast: Ema::new(fast_period),
            slow: Ema::new(slow_period),
            signal: Ema::new(signal_period),
            divergence_lookback,
            samples: 0,
            closes: History::new(),
            macd_values: History::new(),
            signal_values: History::new(),
            histogram: History::new(),
        })
    }

    pub fn macd(&self) -> Option<f64> {
        self.macd_values.last()
    }

    pub fn signal(&self) -> Option<f64> {
        self.signal_values.last()
    }

    pub fn histogram(&self) -> Option<f64> {
        self.histogram.last()
    }

    fn crossing_points(&self) -> Result<Option<(f64, f64, f64, f64)>, IndicatorError> {
        let macd = self.macd_values.last_pair("MACD")?;
        let signal = self.signal_values.last_pair("MACD signal")?;
        Ok(match (macd, signal) {
            (Some((pm, m)), Some((ps, s))) => Some((pm, ps, m, s)),
            _ => None,
        })
    }
}

impl Indicator for Macd {
    fn name(&self) -> &'static str {
        "MACD"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        self.closes.push(index, sample.close);

        let fast = self.fast.update(sample.close);
        let slow = self.slow.update(sample.close);
        if let (Some(fast), Some(slow)) = (fast, slow) {
            let macd = fast - slow;
            self.macd_values.push(index, macd);
            if let Some(signal) = self.signal.update(macd) {
                self.signal_values.push(index, signal);
                self.histogram.push(index, macd - signal);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.samples = 0;
        self.closes.clear();
        self.macd_values.clear();
        self.signal_values.clear();
        self.histogram.clear();
    }

    fn is_ready(&self) -> bool {
        !self.signal_values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        let mut series = Vec::new();
        if !self.macd_values.is_empty() {
            series.push(self.macd_values.to_series("MACD", SeriesKind::Line, start, interval));
        }
        if !self.signal_values.is_empty() {
            series.push(self.signal_values.to_series("MACD Signal", SeriesKind::Line, start, interval));
            series.push(self.histogram.to_series("MACD Histogram", SeriesKind::Histogram, start, interval));
        }
        series
    }
}

impl CrossoverSignal for Macd {
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((pm, ps, m, s)) => crossed_above(pm, ps, m, s),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.crossing_points()? {
            Some((pm, ps, m, s)) => crossed_below(pm, ps, m, s),
            None => false,
        })
    }
}

impl TrendSignal for Macd {
    fn trend(&self) -> Trend {
        match self.histogram() {
            Some(h) if h > 0.0 => Trend::Bullish,
            Some(h) if h < 0.0 => Trend::Bearish,
            _ => Trend::Neutral,
        }
    }
}

impl DivergenceSignal for Macd {
    fn divergence(&self) -> Result<Divergence, IndicatorError> {
        detect_divergence(&self.closes, &self.macd_values, self.divergence_lookback)
    }
}

//! RSI with Wilder's smoothing
//!
//! The first value is seeded from the simple average of the first `period`
//! gains and losses; every later value uses Wilder's recursive smoothing.

use chrono::{DateTime, Duration, Utc};

use super::{
    check_sample, classify_zone, crossed_above, crossed_below, detect_divergence, ensure_period,
    CrossoverSignal, DivergenceSignal, History, Indicator, ZoneSignal,
};
use crate::error::IndicatorError;
use crate::types::{Divergence, PlotSeries, Sample, SeriesKind, Zone};

#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    period: usize,
    overbought: f64,
    oversold: f64,
    divergence_lookback: usize,
    prev_close: Option<f64>,
    seed_gain: f64,
    seed_loss: f64,
    seed_count: usize,
    /// (avg_gain, avg_loss) once seeded
    averages: Option<(f64, f64)>,
    samples: usize,
    closes: History,
    values: History,
}

impl Rsi {
    pub fn new(
        period: usize,
        overbought: f64,
        oversold: f64,
        divergence_lookback: usize,
    ) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        ensure_period("divergence_lookback", divergence_lookback)?;
        check_bands(oversold, overbought)?;

        Ok(Self {
            period,
            overbought,
            oversold,
            divergence_lookback,
            prev_close: None,
            seed_gain: 0.0,
            seed_loss: 0.0,
            seed_count: 0,
            averages: None,
            samples: 0,
            closes: History::new(),
            values: History::new(),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    /// Latest RSI value
    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn previous(&self) -> Option<f64> {
        self.values.previous()
    }

    pub fn values(&self) -> &History {
        &self.values
    }

    fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss < 1e-12 && avg_gain < 1e-12 {
            return 50.0; // No movement
        }
        if avg_loss < 1e-12 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

/// Oversold must sit strictly below overbought, both within [0, 100]
pub(crate) fn check_bands(oversold: f64, overbought: f64) -> Result<(), IndicatorError> {
    if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
        return Err(IndicatorError::invalid_parameter(
            "bands",
            format!("oversold {oversold} and overbought {overbought} must lie in [0, 100]"),
        ));
    }
    if oversold >= overbought {
        return Err(IndicatorError::invalid_parameter(
            "bands",
            format!("oversold {oversold} must be below overbought {overbought}"),
        ));
    }
    Ok(())
}

impl Indicator for Rsi {
    fn name(&self) -> &'static str {
        "RSI"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        self.closes.push(index, sample.close);

        if let Some(prev) = self.prev_close {
            let change = sample.close - prev;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            let period = self.period as f64;

            self.averages = match self.averages {
                Some((avg_gain, avg_loss)) => Some((
                    (avg_gain * (period - 1.0) + gain) / period,
                    (avg_loss * (period - 1.0) + loss) / period,
                )),
                None => {
                    self.seed_gain += gain;
                    self.seed_loss += loss;
                    self.seed_count += 1;
                    if self.seed_count >= self.period {
                        Some((self.seed_gain / period, self.seed_loss / period))
                    } else {
                        None
                    }
                }
            };

            if let Some((avg_gain, avg_loss)) = self.averages {
                self.values.push(index, Self::rsi_from(avg_gain, avg_loss));
            }
        }

        self.prev_close = Some(sample.close);
        Ok(())
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.seed_gain = 0.0;
        self.seed_loss = 0.0;
        self.seed_count = 0;
        self.averages = None;
        self.samples = 0;
        self.closes.clear();
        self.values.clear();
    }

    fn is_ready(&self) -> bool {
        !self.values.is_empty()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        if self.values.is_empty() {
            return Vec::new();
        }
        vec![self.values.to_series("RSI", SeriesKind::Line, start, interval)]
    }
}

impl CrossoverSignal for Rsi {
    /// RSI rose back through the oversold band
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("RSI")? {
            Some((prev, cur)) => crossed_above(prev, self.oversold, cur, self.oversold),
            None => false,
        })
    }

    /// RSI fell back through the overbought band
    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("RSI")? {
            Some((prev, cur)) => crossed_below(prev, self.overbought, cur, self.overbought),
            None => false,
        })
    }
}

impl ZoneSignal for Rsi {
    fn zone(&self) -> Zone {
        classify_zone(self.value(), self.oversold, self.overbought)
    }
}

impl DivergenceSignal for Rsi {
    fn divergence(&self) -> Result<Divergence, IndicatorError> {
        detect_divergence(&self.closes, &self.values, self.divergence_lookback)
    }
}

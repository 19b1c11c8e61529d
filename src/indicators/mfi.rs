//! Money Flow Index - volume-weighted RSI over typical prices

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::rsi::check_bands;
use super::{
    check_sample, classify_zone, crossed_above, crossed_below, detect_divergence, ensure_period,
    push_bounded, CrossoverSignal, DivergenceSignal, History, Indicator, ZoneSignal,
};
use crate::error::IndicatorError;
use crate::types::{Divergence, PlotSeries, Sample, SeriesKind, Zone};

#[derive(Debug, Clone, PartialEq)]
pub struct Mfi {
    period: usize,
    overbought: f64,
    oversold: f64,
    divergence_lookback: usize,
    prev_typical: Option<f64>,
    /// (positive flow, negative flow) per step
    flows: VecDeque<(f64, f64)>,
    samples: usize,
    closes: History,
    values: History,
}

impl Mfi {
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
            prev_typical: None,
            flows: VecDeque::with_capacity(period),
            samples: 0,
            closes: History::new(),
            values: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn previous(&self) -> Option<f64> {
        self.values.previous()
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    fn current_mfi(&self) -> f64 {
        let positive: f64 = self.flows.iter().map(|(p, _)| p).sum();
        let negative: f64 = self.flows.iter().map(|(_, n)| n).sum();
        if negative < 1e-12 {
            if positive < 1e-12 {
                return 50.0;
            }
            return 100.0;
        }
        100.0 - 100.0 / (1.0 + positive / negative)
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &'static str {
        "MFI"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        self.closes.push(index, sample.close);

        let typical = sample.typical_price();
        if let Some(prev) = self.prev_typical {
            let raw_flow = typical * sample.volume;
            let flow = if typical > prev {
                (raw_flow, 0.0)
            } else if typical < prev {
                (0.0, raw_flow)
            } else {
                (0.0, 0.0)
            };
            push_bounded(&mut self.flows, flow, self.period);

            if self.flows.len() >= self.period {
                let mfi = self.current_mfi();
                self.values.push(index, mfi);
            }
        }
        self.prev_typical = Some(typical);
        Ok(())
    }

    fn reset(&mut self) {
        self.prev_typical = None;
        self.flows.clear();
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
        vec![self.values.to_series("MFI", SeriesKind::Line, start, interval)]
    }
}

impl CrossoverSignal for Mfi {
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("MFI")? {
            Some((prev, cur)) => crossed_above(prev, self.oversold, cur, self.oversold),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.values.last_pair("MFI")? {
            Some((prev, cur)) => crossed_below(prev, self.overbought, cur, self.overbought),
            None => false,
        })
    }
}

impl ZoneSignal for Mfi {
    fn zone(&self) -> Zone {
        classify_zone(self.value(), self.oversold, self.overbought)
    }
}

impl DivergenceSignal for Mfi {
    fn divergence(&self) -> Result<Divergence, IndicatorError> {
        detect_divergence(&self.closes, &self.values, self.divergence_lookback)
    }
}

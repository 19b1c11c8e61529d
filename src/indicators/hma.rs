//! Hull Moving Average
//!
//! HMA(n) = WMA(2 * WMA(n/2) - WMA(n), sqrt(n)). Crossovers are price
//! crossing the average; trend is the slope of the average.

use chrono::{DateTime, Duration, Utc};

use super::{
    check_sample, crossed_above, crossed_below, ensure_period, CrossoverSignal, History,
    Indicator, TrendSignal, Wma,
};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct Hma {
    period: usize,
    half: Wma,
    full: Wma,
    smooth: Wma,
    samples: usize,
    closes: History,
    values: History,
}

impl Hma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        ensure_period("period", period)?;
        let half_period = (period / 2).max(1);
        let sqrt_period = ((period as f64).sqrt().round() as usize).max(1);

        Ok(Self {
            period,
            half: Wma::new(half_period),
            full: Wma::new(period),
            smooth: Wma::new(sqrt_period),
            samples: 0,
            closes: History::new(),
            values: History::new(),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn previous(&self) -> Option<f64> {
        self.values.previous()
    }

    /// (previous close, close, previous HMA, HMA) once two HMA values exist
    fn last_points(&self) -> Result<Option<(f64, f64, f64, f64)>, IndicatorError> {
        let hma = self.values.last_pair("HMA")?;
        let price = self.closes.last_pair("close")?;
        Ok(match (price, hma) {
            (Some((pc, c)), Some((ph, h))) => Some((pc, c, ph, h)),
            _ => None,
        })
    }
}

impl Indicator for Hma {
    fn name(&self) -> &'static str {
        "HMA"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;
        self.closes.push(index, sample.close);

        let half = self.half.update(sample.close);
        let full = self.full.update(sample.close);
        if let (Some(half), Some(full)) = (half, full) {
            if let Some(hma) = self.smooth.update(2.0 * half - full) {
                self.values.push(index, hma);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.half.reset();
        self.full.reset();
        self.smooth.reset();
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
        vec![self.values.to_series("HMA", SeriesKind::Line, start, interval)]
    }
}

impl CrossoverSignal for Hma {
    /// Close moved from at-or-below the HMA to above it
    fn is_bullish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.last_points()? {
            Some((pc, c, ph, h)) => crossed_above(pc, ph, c, h),
            None => false,
        })
    }

    fn is_bearish_crossover(&self) -> Result<bool, IndicatorError> {
        Ok(match self.last_points()? {
            Some((pc, c, ph, h)) => crossed_below(pc, ph, c, h),
            None => false,
        })
    }
}

impl TrendSignal for Hma {
    fn trend(&self) -> Trend {
        match (self.previous(), self.value()) {
            (Some(prev), Some(cur)) if cur > prev => Trend::Bullish,
            (Some(prev), Some(cur)) if cur < prev => Trend::Bearish,
            _ => Trend::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_hma_tracks_linear_trend() {
        let mut hma = Hma::new(4).unwrap();
        for i in 0..12 {
            hma.add(&flat(100.0 + i as f64)).unwrap();
        }
        // HMA is lag-free on a straight line
        assert!((hma.value().unwrap() - 111.0).abs() < 1e-9);
        assert_eq!(hma.trend(), Trend::Bullish);
    }

    #[test]
    fn test_hma_price_crossover() {
        let mut hma = Hma::new(4).unwrap();
        for _ in 0..8 {
            hma.add(&flat(100.0)).unwrap();
        }
        assert!(!hma.is_bullish_crossover().unwrap());
        hma.add(&flat(104.0)).unwrap();
        assert!(hma.is_bullish_crossover().unwrap());
        assert!(!hma.is_bearish_crossover().unwrap());
    }

    #[test]
    fn test_hma_rejects_zero_period() {
        assert!(Hma::new(0).is_err());
    }
}

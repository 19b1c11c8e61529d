//! Parabolic stop-and-reverse (Wilder)

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::{check_sample, push_bounded, History, Indicator};
use crate::error::IndicatorError;
use crate::types::{PlotSeries, Sample, SeriesKind};

#[derive(Debug, Clone, Copy, PartialEq)]
struct SarState {
    uptrend: bool,
    sar: f64,
    extreme: f64,
    af: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParabolicSar {
    af_start: f64,
    af_step: f64,
    af_max: f64,
    /// Last two highs/lows, used to seed and to clamp the stop
    highs: VecDeque<f64>,
    lows: VecDeque<f64>,
    prev_close: Option<f64>,
    state: Option<SarState>,
    samples: usize,
    values: History,
}

impl ParabolicSar {
    pub fn new(af_start: f64, af_step: f64, af_max: f64) -> Result<Self, IndicatorError> {
        for (name, v) in [("af_start", af_start), ("af_step", af_step), ("af_max", af_max)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(IndicatorError::invalid_parameter(name, "must be a positive number"));
            }
        }
        if af_max < af_start {
            return Err(IndicatorError::invalid_parameter(
                "af_max",
                format!("maximum {af_max} is below start {af_start}"),
            ));
        }

        Ok(Self {
            af_start,
            af_step,
            af_max,
            highs: VecDeque::with_capacity(2),
            lows: VecDeque::with_capacity(2),
            prev_close: None,
            state: None,
            samples: 0,
            values: History::new(),
        })
    }

    pub fn value(&self) -> Option<f64> {
        self.state.map(|s| s.sar)
    }

    /// `None` until two samples have been seen
    pub fn is_uptrend(&self) -> Option<bool> {
        self.state.map(|s| s.uptrend)
    }

    fn seed(&self, sample: &Sample, prev_close: f64) -> Option<SarState> {
        let prev_high = *self.highs.back()?;
        let prev_low = *self.lows.back()?;
        let uptrend = sample.close >= prev_close;
        Some(if uptrend {
            SarState {
                uptrend,
                sar: prev_low.min(sample.low),
                extreme: prev_high.max(sample.high),
                af: self.af_start,
            }
        } else {
            SarState {
                uptrend,
                sar: prev_high.max(sample.high),
                extreme: prev_low.min(sample.low),
                af: self.af_start,
            }
        })
    }

    fn step(&self, mut state: SarState, sample: &Sample) -> SarState {
        let mut next = state.sar + state.af * (state.extreme - state.sar);

        if state.uptrend {
            // The stop may not sit above either of the two prior lows
            next = self.lows.iter().cloned().fold(next, f64::min);
            if sample.low < next {
                let flipped = SarState {
                    uptrend: false,
                    sar: state.extreme,
                    extreme: sample.low,
                    af: self.af_start,
                };
                return flipped;
            }
            if sample.high > state.extreme {
                state.extreme = sample.high;
                state.af = (state.af + self.af_step).min(self.af_max);
            }
        } else {
            next = self.highs.iter().cloned().fold(next, f64::max);
            if sample.high > next {
                let flipped = SarState {
                    uptrend: true,
                    sar: state.extreme,
                    extreme: sample.high,
                    af: self.af_start,
                };
                return flipped;
            }
            if sample.low < state.extreme {
                state.extreme = sample.low;
                state.af = (state.af + self.af_step).min(self.af_max);
            }
        }

        state.sar = next;
        state
    }
}

impl Indicator for ParabolicSar {
    fn name(&self) -> &'static str {
        "SAR"
    }

    fn add(&mut self, sample: &Sample) -> Result<(), IndicatorError> {
        check_sample(sample)?;
        let index = self.samples;
        self.samples += 1;

        let next = match (self.state, self.prev_close) {
            (Some(state), _) => Some(self.step(state, sample)),
            (None, Some(prev_close)) => self.seed(sample, prev_close),
            (None, None) => None,
        };
        if let Some(state) = next {
            self.state = Some(state);
            self.values.push(index, state.sar);
        }

        push_bounded(&mut self.highs, sample.high, 2);
        push_bounded(&mut self.lows, sample.low, 2);
        self.prev_close = Some(sample.close);
        Ok(())
    }

    fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.prev_close = None;
        self.state = None;
        self.samples = 0;
        self.values.clear();
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        if self.values.is_empty() {
            return Vec::new();
        }
        vec![self.values.to_series("SAR", SeriesKind::Scatter, start, interval)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::flat;

    #[test]
    fn test_sar_trails_below_in_uptrend() {
        let mut sar = ParabolicSar::new(0.02, 0.02, 0.2).unwrap();
        for i in 0..15 {
            sar.add(&flat(100.0 + i as f64)).unwrap();
        }
        assert_eq!(sar.is_uptrend(), Some(true));
        assert!(sar.value().unwrap() < 114.0);
    }

    #[test]
    fn test_sar_reverses_on_breakdown() {
        let mut sar = ParabolicSar::new(0.02, 0.02, 0.2).unwrap();
        for i in 0..10 {
            sar.add(&flat(100.0 + i as f64)).unwrap();
        }
        assert_eq!(sar.is_uptrend(), Some(true));
        sar.add(&flat(80.0)).unwrap();
        assert_eq!(sar.is_uptrend(), Some(false));
        // Stop jumps to the prior extreme high
        assert_eq!(sar.value(), Some(109.5));
    }

    #[test]
    fn test_sar_rejects_bad_acceleration() {
        assert!(ParabolicSar::new(0.0, 0.02, 0.2).is_err());
        assert!(ParabolicSar::new(0.3, 0.02, 0.2).is_err());
    }
}

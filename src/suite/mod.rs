//! Indicator suites - fixed collaborator sets plus a fusion rule
//!
//! A suite exclusively owns its collaborators, validates each sample before
//! any of them sees it, and recomputes the composite label from current
//! collaborator state on every query.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{IndicatorError, Result, SuiteError};
use crate::indicators::Indicator;
use crate::types::{CompositeSignal, Divergence, PlotSeries, Sample};

mod scalping;
mod standard;

pub use scalping::ScalpingSuite;
pub use standard::StandardSuite;

/// Divergence entries keyed by collaborator name; only detections are present
pub type DivergenceReport = HashMap<String, Divergence>;

/// Common surface of both suites
pub trait SignalSuite {
    /// Short identifier used in logs and signal files
    fn kind(&self) -> &'static str;

    fn add(&mut self, sample: &Sample) -> Result<()>;

    fn combined_signal(&self) -> Result<CompositeSignal>;

    fn combined_bearish_signal(&self) -> Result<CompositeSignal>;

    fn divergence_signals(&self) -> Result<DivergenceReport>;

    fn reset(&mut self);

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries>;

    fn samples_seen(&self) -> usize;
}

/// Scalars fusion needs that no collaborator exposes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceCache {
    last_close: f64,
    prev_close: f64,
    last_high: f64,
    last_low: f64,
    has_close: bool,
    samples: usize,
}

impl PriceCache {
    /// Record a sample every collaborator has accepted
    pub fn record(&mut self, sample: &Sample) {
        self.prev_close = self.last_close;
        self.last_close = sample.close;
        self.last_high = sample.high;
        self.last_low = sample.low;
        self.has_close = true;
        self.samples += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_close(&self) -> bool {
        self.has_close
    }

    pub fn last_close(&self) -> Option<f64> {
        self.has_close.then_some(self.last_close)
    }

    /// Close before the latest one; `None` until two samples were recorded
    pub fn prev_close(&self) -> Option<f64> {
        (self.samples >= 2).then_some(self.prev_close)
    }

    pub fn last_high(&self) -> Option<f64> {
        self.has_close.then_some(self.last_high)
    }

    pub fn last_low(&self) -> Option<f64> {
        self.has_close.then_some(self.last_low)
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Which extra checks a suite applies on top of the shared ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SampleRules {
    Standard,
    /// Also requires non-negative high and low
    Strict,
}

/// Reject a sample before any collaborator is touched.
///
/// Shape first, then value ranges.
pub(crate) fn validate_sample(sample: &Sample, rules: SampleRules) -> Result<()> {
    let reject = |reason: String| -> Result<()> {
        debug!(?sample, %reason, "sample rejected");
        Err(SuiteError::InvalidSample(reason))
    };

    if !(sample.high >= sample.low) {
        return reject(format!("high {} is below low {}", sample.high, sample.low));
    }
    if !sample.high.is_finite() || !sample.low.is_finite() {
        return reject("high and low must be finite".to_string());
    }
    if !sample.close.is_finite() || sample.close < 0.0 {
        return reject(format!("close {} must be a non-negative number", sample.close));
    }
    if !sample.volume.is_finite() || sample.volume < 0.0 {
        return reject(format!("volume {} must be a non-negative number", sample.volume));
    }
    if rules == SampleRules::Strict && (sample.high < 0.0 || sample.low < 0.0) {
        return reject(format!(
            "high {} and low {} must be non-negative",
            sample.high, sample.low
        ));
    }
    Ok(())
}

/// Wrap a collaborator constructor failure with its identity
pub(crate) fn construct<T>(
    indicator: &'static str,
    built: std::result::Result<T, IndicatorError>,
) -> Result<T> {
    built.map_err(|source| SuiteError::Construction { indicator, source })
}

/// Forward a sample in order, stopping at the first rejection.
///
/// Collaborators before the failing one keep the sample; nothing is rolled
/// back.
pub(crate) fn feed(collaborators: &mut [&mut dyn Indicator], sample: &Sample) -> Result<()> {
    for collaborator in collaborators.iter_mut() {
        let indicator = collaborator.name();
        collaborator.add(sample).map_err(|source| {
            debug!(indicator, error = %source, "collaborator rejected sample");
            SuiteError::Ingestion { indicator, source }
        })?;
    }
    Ok(())
}

pub(crate) fn reset_all(collaborators: &mut [&mut dyn Indicator]) {
    for collaborator in collaborators.iter_mut() {
        collaborator.reset();
    }
}

pub(crate) fn collect_plots(
    collaborators: &[&dyn Indicator],
    start: DateTime<Utc>,
    interval: Duration,
) -> Vec<PlotSeries> {
    collaborators
        .iter()
        .flat_map(|c| c.plot_data(start, interval))
        .collect()
}

/// Insert a detected divergence under the collaborator's name
pub(crate) fn record_divergence(
    report: &mut DivergenceReport,
    indicator: &str,
    divergence: Divergence,
) {
    if divergence.is_detected() {
        report.insert(indicator.to_string(), divergence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::vwap::Vwap;
    use mockall::mock;

    mock! {
        Collaborator {}
        impl Indicator for Collaborator {
            fn name(&self) -> &'static str;
            fn add(&mut self, sample: &Sample) -> std::result::Result<(), IndicatorError>;
            fn reset(&mut self);
            fn is_ready(&self) -> bool;
            fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries>;
        }
    }

    #[test]
    fn test_feed_stops_at_first_rejection_without_rollback() {
        let mut first = Vwap::new();
        let mut rejecting = MockCollaborator::new();
        rejecting.expect_name().return_const("ATSO");
        rejecting
            .expect_add()
            .times(1)
            .returning(|_| Err(IndicatorError::InvalidSample("rejected".to_string())));
        let mut untouched = MockCollaborator::new();
        untouched.expect_name().return_const("HMA");
        untouched.expect_add().never();

        let sample = Sample::new(11.0, 9.0, 10.0, 5.0);
        let mut collaborators: [&mut dyn Indicator; 3] =
            [&mut first, &mut rejecting, &mut untouched];
        let err = feed(&mut collaborators, &sample).unwrap_err();

        assert!(matches!(
            err,
            SuiteError::Ingestion {
                indicator: "ATSO",
                source: IndicatorError::InvalidSample(_)
            }
        ));
        assert_eq!(err.indicator(), Some("ATSO"));
        assert!(first.is_ready());
        assert_eq!(first.value(), Some(10.0));
    }

    #[test]
    fn test_price_cache_shifts_close() {
        let mut cache = PriceCache::default();
        assert_eq!(cache.last_close(), None);
        cache.record(&Sample::new(11.0, 9.0, 10.0, 1.0));
        assert_eq!(cache.last_close(), Some(10.0));
        assert_eq!(cache.prev_close(), None);
        cache.record(&Sample::new(13.0, 11.0, 12.0, 1.0));
        assert_eq!(cache.prev_close(), Some(10.0));
        assert_eq!(cache.last_high(), Some(13.0));
        assert_eq!(cache.last_low(), Some(11.0));
        cache.clear();
        assert_eq!(cache, PriceCache::default());
    }

    #[test]
    fn test_validation_order() {
        // Inverted shape is reported even when other fields are also bad
        let err = validate_sample(&Sample::new(1.0, 2.0, -1.0, -1.0), SampleRules::Standard)
            .unwrap_err();
        assert!(err.to_string().contains("below low"));

        let err = validate_sample(&Sample::new(2.0, 1.0, -1.0, 1.0), SampleRules::Standard)
            .unwrap_err();
        assert!(err.to_string().contains("close"));

        let err = validate_sample(&Sample::new(2.0, 1.0, 1.0, f64::NAN), SampleRules::Standard)
            .unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn test_strict_rules_reject_negative_extremes() {
        let sample = Sample::new(-1.0, -2.0, 0.0, 1.0);
        assert!(validate_sample(&sample, SampleRules::Standard).is_ok());
        assert!(matches!(
            validate_sample(&sample, SampleRules::Strict),
            Err(SuiteError::InvalidSample(_))
        ));
    }

    #[test]
    fn test_nan_high_is_a_shape_error() {
        let err = validate_sample(&Sample::new(f64::NAN, 1.0, 1.0, 1.0), SampleRules::Standard)
            .unwrap_err();
        assert!(err.to_string().contains("below low"));
    }
}

//! Standard suite - six collaborators fused by a weighted crossover vote

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{
    collect_plots, construct, feed, record_divergence, reset_all, validate_sample,
    DivergenceReport, PriceCache, SampleRules, SignalSuite,
};
use crate::config::IndicatorConfig;
use crate::error::{Result, SuiteError};
use crate::fusion::vote::{self, StandardWeights, Voter};
use crate::indicators::{Amdo, Atso, DivergenceSignal, Hma, Indicator, Mfi, Rsi, Vwao};
use crate::types::{Bias, CompositeSignal, PlotSeries, Sample};

#[derive(Debug, Clone, PartialEq)]
pub struct StandardSuite {
    rsi: Rsi,
    mfi: Mfi,
    vwao: Vwao,
    hma: Hma,
    amdo: Amdo,
    atso: Atso,
    weights: StandardWeights,
    config: IndicatorConfig,
    cache: PriceCache,
}

impl StandardSuite {
    /// Build with the default indicator configuration
    pub fn new() -> Result<Self> {
        Self::with_config(IndicatorConfig::default())
    }

    pub fn with_config(config: IndicatorConfig) -> Result<Self> {
        config.validate()?;
        let lookback = config.divergence_lookback;

        let rsi = construct(
            "RSI",
            Rsi::new(config.rsi_period, config.rsi_overbought, config.rsi_oversold, lookback),
        )?;
        let mfi = construct(
            "MFI",
            Mfi::new(config.mfi_period, config.mfi_overbought, config.mfi_oversold, lookback),
        )?;
        let vwao = construct("VWAO", Vwao::new(config.vwao_fast, config.vwao_slow))?;
        let hma = construct("HMA", Hma::new(config.hma_period))?;
        let amdo = construct(
            "AMDO",
            Amdo::new(config.amdo_period, config.amdo_smoothing, config.amdo_signal, lookback),
        )?;
        let atso = construct("ATSO", Atso::new(config.atso_fast, config.atso_slow))?;

        Ok(Self {
            rsi,
            mfi,
            vwao,
            hma,
            amdo,
            atso,
            weights: StandardWeights::DEFAULT,
            config,
            cache: PriceCache::default(),
        })
    }

    pub fn rsi(&self) -> &Rsi {
        &self.rsi
    }

    pub fn mfi(&self) -> &Mfi {
        &self.mfi
    }

    pub fn vwao(&self) -> &Vwao {
        &self.vwao
    }

    pub fn hma(&self) -> &Hma {
        &self.hma
    }

    pub fn amdo(&self) -> &Amdo {
        &self.amdo
    }

    pub fn atso(&self) -> &Atso {
        &self.atso
    }

    pub fn weights(&self) -> &StandardWeights {
        &self.weights
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn last_close(&self) -> Option<f64> {
        self.cache.last_close()
    }

    pub fn prev_close(&self) -> Option<f64> {
        self.cache.prev_close()
    }

    pub fn last_high(&self) -> Option<f64> {
        self.cache.last_high()
    }

    pub fn last_low(&self) -> Option<f64> {
        self.cache.last_low()
    }

    pub fn has_close(&self) -> bool {
        self.cache.has_close()
    }

    fn vote(&self, bias: Bias) -> Result<CompositeSignal> {
        let w = &self.weights;
        let voters = [
            Voter::new("RSI", w.rsi, &self.rsi),
            Voter::new("MFI", w.mfi, &self.mfi),
            Voter::new("VWAO", w.vwao, &self.vwao),
            Voter::new("HMA", w.hma, &self.hma),
            Voter::new("AMDO", w.amdo, &self.amdo),
        ];
        let mut tally = vote::tally_crossovers(&voters, bias)?;

        // ATSO votes through its raw sign change, which cannot fail
        let atso_fired = match bias {
            Bias::Bullish => self.atso.crossed_above_zero(),
            Bias::Bearish => self.atso.crossed_below_zero(),
        };
        if atso_fired {
            tally.record("ATSO", w.atso);
        }

        let signal = vote::classify(&tally, bias);
        debug!(
            %bias,
            sum = tally.sum,
            count = tally.count,
            triggered = ?tally.triggered,
            %signal,
            "standard vote"
        );
        Ok(signal)
    }

    fn divergence_of(
        report: &mut DivergenceReport,
        indicator: &'static str,
        source: &dyn DivergenceSignal,
    ) -> Result<()> {
        let divergence = source
            .divergence()
            .map_err(|source| SuiteError::Query { indicator, source })?;
        record_divergence(report, indicator, divergence);
        Ok(())
    }
}

impl SignalSuite for StandardSuite {
    fn kind(&self) -> &'static str {
        "standard"
    }

    fn add(&mut self, sample: &Sample) -> Result<()> {
        validate_sample(sample, SampleRules::Standard)?;
        feed(
            &mut [
                &mut self.rsi,
                &mut self.mfi,
                &mut self.vwao,
                &mut self.hma,
                &mut self.amdo,
                &mut self.atso,
            ],
            sample,
        )?;
        self.cache.record(sample);
        Ok(())
    }

    fn combined_signal(&self) -> Result<CompositeSignal> {
        self.vote(Bias::Bullish)
    }

    fn combined_bearish_signal(&self) -> Result<CompositeSignal> {
        self.vote(Bias::Bearish)
    }

    /// Any collaborator failure aborts the whole report
    fn divergence_signals(&self) -> Result<DivergenceReport> {
        let mut report = DivergenceReport::new();
        Self::divergence_of(&mut report, "RSI", &self.rsi)?;
        Self::divergence_of(&mut report, "MFI", &self.mfi)?;
        Self::divergence_of(&mut report, "AMDO", &self.amdo)?;
        Ok(report)
    }

    fn reset(&mut self) {
        reset_all(&mut [
            &mut self.rsi,
            &mut self.mfi,
            &mut self.vwao,
            &mut self.hma,
            &mut self.amdo,
            &mut self.atso,
        ]);
        self.cache.clear();
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        let collaborators: [&dyn Indicator; 6] = [
            &self.rsi, &self.mfi, &self.vwao, &self.hma, &self.amdo, &self.atso,
        ];
        collect_plots(&collaborators, start, interval)
    }

    fn samples_seen(&self) -> usize {
        self.cache.samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::wave;

    #[test]
    fn test_fresh_suite_is_neutral() {
        let suite = StandardSuite::new().unwrap();
        assert_eq!(suite.combined_signal().unwrap(), CompositeSignal::Neutral);
        assert_eq!(suite.combined_bearish_signal().unwrap(), CompositeSignal::Neutral);
        assert!(suite.divergence_signals().unwrap().is_empty());
        assert!(suite.plot_data(Utc::now(), Duration::minutes(1)).is_empty());
        assert!(!suite.has_close());
    }

    #[test]
    fn test_invalid_bands_fail_before_construction() {
        let config = IndicatorConfig {
            mfi_oversold: 85.0,
            ..IndicatorConfig::default()
        };
        assert!(matches!(StandardSuite::with_config(config), Err(SuiteError::Config(_))));
    }

    #[test]
    fn test_zero_period_names_collaborator() {
        let config = IndicatorConfig {
            hma_period: 0,
            ..IndicatorConfig::default()
        };
        let err = StandardSuite::with_config(config).unwrap_err();
        assert_eq!(err.indicator(), Some("HMA"));
        assert!(err.to_string().starts_with("failed to create HMA"));
    }

    #[test]
    fn test_add_updates_cache_and_collaborators() {
        let mut suite = StandardSuite::new().unwrap();
        for s in wave(60) {
            suite.add(&s).unwrap();
        }
        assert_eq!(suite.samples_seen(), 60);
        assert!(suite.rsi().is_ready());
        assert!(suite.atso().is_ready());
        assert!(suite.prev_close().is_some());
        assert_eq!(suite.last_close(), wave(60).last().map(|s| s.close));
    }

    #[test]
    fn test_rejected_sample_changes_nothing() {
        let mut suite = StandardSuite::new().unwrap();
        for s in wave(30) {
            suite.add(&s).unwrap();
        }
        let before = suite.clone();
        let err = suite.add(&Sample::new(99.0, 101.0, 100.0, 10.0)).unwrap_err();
        assert!(matches!(err, SuiteError::InvalidSample(_)));
        assert_eq!(suite, before);
    }

    #[test]
    fn test_reset_matches_fresh_suite() {
        let mut suite = StandardSuite::new().unwrap();
        for s in wave(80) {
            suite.add(&s).unwrap();
        }
        suite.reset();
        assert_eq!(suite, StandardSuite::new().unwrap());
    }

    #[test]
    fn test_plot_order() {
        let mut suite = StandardSuite::new().unwrap();
        for s in wave(80) {
            suite.add(&s).unwrap();
        }
        let names: Vec<String> = suite
            .plot_data(Utc::now(), Duration::minutes(1))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["RSI", "MFI", "VWAO", "HMA", "AMDO", "AMDO Signal", "ATSO"]);
    }
}

//! Scalping suite - ten fast collaborators fused by a volatility-adaptive
//! score
//!
//! The score encodes both directions, so the bearish query returns the same
//! label as the bullish one. Divergence queries are tolerant: a failing
//! collaborator is logged and reported as no divergence.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::{
    collect_plots, construct, feed, record_divergence, reset_all, validate_sample,
    DivergenceReport, PriceCache, SampleRules, SignalSuite,
};
use crate::config::IndicatorConfig;
use crate::error::{Result, SuiteError};
use crate::fusion::score::{self, Crossing, ScalpingReadings};
use crate::indicators::{
    Atr, Bollinger, Cci, CrossoverSignal, DivergenceSignal, Hma, Indicator, Macd, Mfi,
    ParabolicSar, Rsi, Stochastic, TrendSignal, Vwap, ZoneSignal,
};
use crate::types::{CompositeSignal, PlotSeries, Sample};

#[derive(Debug, Clone, PartialEq)]
pub struct ScalpingSuite {
    rsi: Rsi,
    stochastic: Stochastic,
    macd: Macd,
    cci: Cci,
    hma: Hma,
    sar: ParabolicSar,
    bollinger: Bollinger,
    atr: Atr,
    vwap: Vwap,
    mfi: Mfi,
    config: IndicatorConfig,
    cache: PriceCache,
}

impl ScalpingSuite {
    /// Build with the shortened scalping periods
    pub fn new() -> Result<Self> {
        Self::with_config(IndicatorConfig::scalping())
    }

    pub fn with_config(config: IndicatorConfig) -> Result<Self> {
        config.validate()?;
        let c = &config;
        let lookback = c.divergence_lookback;

        let rsi = construct(
            "RSI",
            Rsi::new(c.rsi_period, c.rsi_overbought, c.rsi_oversold, lookback),
        )?;
        let stochastic = construct(
            "Stochastic",
            Stochastic::new(
                c.stoch_k_period,
                c.stoch_d_period,
                c.stoch_overbought,
                c.stoch_oversold,
            ),
        )?;
        let macd = construct(
            "MACD",
            Macd::new(c.macd_fast, c.macd_slow, c.macd_signal, lookback),
        )?;
        let cci = construct("CCI", Cci::new(c.cci_period))?;
        let hma = construct("HMA", Hma::new(c.hma_period))?;
        let sar = construct(
            "SAR",
            ParabolicSar::new(c.sar_af_start, c.sar_af_step, c.sar_af_max),
        )?;
        let bollinger = construct("Bollinger", Bollinger::new(c.bb_period, c.bb_multiplier))?;
        let atr = construct("ATR", Atr::new(c.atr_period))?;
        let mfi = construct(
            "MFI",
            Mfi::new(c.mfi_period, c.mfi_overbought, c.mfi_oversold, lookback),
        )?;

        Ok(Self {
            rsi,
            stochastic,
            macd,
            cci,
            hma,
            sar,
            bollinger,
            atr,
            vwap: Vwap::new(),
            mfi,
            config,
            cache: PriceCache::default(),
        })
    }

    pub fn rsi(&self) -> &Rsi {
        &self.rsi
    }

    pub fn stochastic(&self) -> &Stochastic {
        &self.stochastic
    }

    pub fn macd(&self) -> &Macd {
        &self.macd
    }

    pub fn cci(&self) -> &Cci {
        &self.cci
    }

    pub fn hma(&self) -> &Hma {
        &self.hma
    }

    pub fn sar(&self) -> &ParabolicSar {
        &self.sar
    }

    pub fn bollinger(&self) -> &Bollinger {
        &self.bollinger
    }

    pub fn atr(&self) -> &Atr {
        &self.atr
    }

    pub fn vwap(&self) -> &Vwap {
        &self.vwap
    }

    pub fn mfi(&self) -> &Mfi {
        &self.mfi
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

    /// Snapshot every view the score reads; crossover failures abort
    pub fn readings(&self) -> Result<ScalpingReadings> {
        Ok(ScalpingReadings {
            rsi_cross: crossing("RSI", &self.rsi)?,
            rsi_zone: self.rsi.zone(),
            stoch_cross: crossing("Stochastic", &self.stochastic)?,
            stoch_zone: self.stochastic.zone(),
            stoch_k: self.stochastic.k(),
            macd_cross: crossing("MACD", &self.macd)?,
            macd_trend: self.macd.trend(),
            cci_cross: crossing("CCI", &self.cci)?,
            cci: self.cci.value(),
            hma_cross: crossing("HMA", &self.hma)?,
            hma_trend: self.hma.trend(),
            sar_uptrend: self.sar.is_uptrend(),
            bands: self.bollinger.bands(),
            atr: self.atr.value(),
            prev_atr: self.atr.previous(),
            vwap: self.vwap.value(),
            mfi_cross: crossing("MFI", &self.mfi)?,
            mfi_zone: self.mfi.zone(),
            last_close: self.cache.last_close(),
            prev_close: self.cache.prev_close(),
        })
    }
}

fn crossing(indicator: &'static str, source: &dyn CrossoverSignal) -> Result<Crossing> {
    let bullish = source
        .is_bullish_crossover()
        .map_err(|e| SuiteError::Query { indicator, source: e })?;
    let bearish = source
        .is_bearish_crossover()
        .map_err(|e| SuiteError::Query { indicator, source: e })?;
    Ok(Crossing::new(bullish, bearish))
}

impl SignalSuite for ScalpingSuite {
    fn kind(&self) -> &'static str {
        "scalping"
    }

    fn add(&mut self, sample: &Sample) -> Result<()> {
        validate_sample(sample, SampleRules::Strict)?;
        feed(
            &mut [
                &mut self.rsi,
                &mut self.stochastic,
                &mut self.macd,
                &mut self.cci,
                &mut self.hma,
                &mut self.sar,
                &mut self.bollinger,
                &mut self.atr,
                &mut self.vwap,
                &mut self.mfi,
            ],
            sample,
        )?;
        self.cache.record(sample);
        Ok(())
    }

    fn combined_signal(&self) -> Result<CompositeSignal> {
        Ok(score::evaluate(&self.readings()?))
    }

    fn combined_bearish_signal(&self) -> Result<CompositeSignal> {
        self.combined_signal()
    }

    /// Never fails; collaborator errors count as no divergence
    fn divergence_signals(&self) -> Result<DivergenceReport> {
        let mut report = DivergenceReport::new();
        let sources: [(&'static str, &dyn DivergenceSignal); 3] =
            [("RSI", &self.rsi), ("MACD", &self.macd), ("MFI", &self.mfi)];

        for (indicator, source) in sources {
            match source.divergence() {
                Ok(divergence) => record_divergence(&mut report, indicator, divergence),
                Err(error) => {
                    warn!(indicator, %error, "divergence query failed, treating as none")
                }
            }
        }
        Ok(report)
    }

    fn reset(&mut self) {
        reset_all(&mut [
            &mut self.rsi,
            &mut self.stochastic,
            &mut self.macd,
            &mut self.cci,
            &mut self.hma,
            &mut self.sar,
            &mut self.bollinger,
            &mut self.atr,
            &mut self.vwap,
            &mut self.mfi,
        ]);
        self.cache.clear();
    }

    fn plot_data(&self, start: DateTime<Utc>, interval: Duration) -> Vec<PlotSeries> {
        let collaborators: [&dyn Indicator; 10] = [
            &self.rsi,
            &self.stochastic,
            &self.macd,
            &self.cci,
            &self.hma,
            &self.sar,
            &self.bollinger,
            &self.atr,
            &self.vwap,
            &self.mfi,
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
    fn test_new_uses_scalping_periods() {
        let suite = ScalpingSuite::new().unwrap();
        assert_eq!(suite.config(), &IndicatorConfig::scalping());
        assert_eq!(suite.rsi().period(), 7);
        assert_eq!(suite.hma().period(), 9);
    }

    #[test]
    fn test_with_config_is_used_as_given() {
        let suite = ScalpingSuite::with_config(IndicatorConfig::default()).unwrap();
        assert_eq!(suite.rsi().period(), 14);
    }

    #[test]
    fn test_fresh_suite_is_neutral() {
        let suite = ScalpingSuite::new().unwrap();
        assert_eq!(suite.combined_signal().unwrap(), CompositeSignal::Neutral);
        assert!(suite.divergence_signals().unwrap().is_empty());
        assert_eq!(suite.readings().unwrap(), ScalpingReadings::default());
    }

    #[test]
    fn test_bearish_query_mirrors_bullish() {
        let mut suite = ScalpingSuite::new().unwrap();
        for s in wave(120) {
            suite.add(&s).unwrap();
            assert_eq!(
                suite.combined_signal().unwrap(),
                suite.combined_bearish_signal().unwrap()
            );
        }
    }

    #[test]
    fn test_rejects_negative_extremes() {
        let mut suite = ScalpingSuite::new().unwrap();
        let before = suite.clone();
        let err = suite.add(&Sample::new(-1.0, -2.0, 0.0, 1.0)).unwrap_err();
        assert!(matches!(err, SuiteError::InvalidSample(_)));
        assert_eq!(suite, before);
    }

    #[test]
    fn test_construction_failure_names_collaborator() {
        let config = IndicatorConfig {
            bb_multiplier: -1.0,
            ..IndicatorConfig::scalping()
        };
        let err = ScalpingSuite::with_config(config).unwrap_err();
        assert_eq!(err.indicator(), Some("Bollinger"));
    }

    #[test]
    fn test_plot_order() {
        let mut suite = ScalpingSuite::new().unwrap();
        for s in wave(60) {
            suite.add(&s).unwrap();
        }
        let names: Vec<String> = suite
            .plot_data(Utc::now(), Duration::minutes(1))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            [
                "RSI",
                "Stochastic %K",
                "Stochastic %D",
                "MACD",
                "MACD Signal",
                "MACD Histogram",
                "CCI",
                "HMA",
                "SAR",
                "Bollinger Upper",
                "Bollinger Middle",
                "Bollinger Lower",
                "ATR",
                "VWAP",
                "MFI",
            ]
        );
    }

    #[test]
    fn test_reset_then_replay_reproduces_signal() {
        let samples = wave(90);
        let mut suite = ScalpingSuite::new().unwrap();
        for s in &samples {
            suite.add(s).unwrap();
        }
        let first = suite.combined_signal().unwrap();
        let first_divergence = suite.divergence_signals().unwrap();

        suite.reset();
        assert_eq!(suite, ScalpingSuite::new().unwrap());
        for s in &samples {
            suite.add(s).unwrap();
        }
        assert_eq!(suite.combined_signal().unwrap(), first);
        assert_eq!(suite.divergence_signals().unwrap(), first_divergence);
    }
}

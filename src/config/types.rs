//! Configuration records shared by the suites and the replay binary

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SuiteError};

/// Flat indicator parameter record.
///
/// Band ordering is checked by [`IndicatorConfig::validate`]; period and
/// multiplier validity is left to each collaborator constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// RSI period
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Money flow index period
    pub mfi_period: usize,
    pub mfi_overbought: f64,
    pub mfi_oversold: f64,
    /// Volume-weighted average oscillator fast/slow windows
    pub vwao_fast: usize,
    pub vwao_slow: usize,
    /// Hull moving average period
    pub hma_period: usize,
    /// Adaptive momentum oscillator momentum, smoothing and signal periods
    pub amdo_period: usize,
    pub amdo_smoothing: usize,
    pub amdo_signal: usize,
    /// Adaptive trend-strength oscillator fast/slow EMA periods
    pub atso_fast: usize,
    pub atso_slow: usize,
    /// Stochastic %K and %D periods
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_overbought: f64,
    pub stoch_oversold: f64,
    /// MACD fast period
    pub macd_fast: usize,
    /// MACD slow period
    pub macd_slow: usize,
    /// MACD signal period
    pub macd_signal: usize,
    /// CCI period
    pub cci_period: usize,
    /// Parabolic SAR acceleration start, step and cap
    pub sar_af_start: f64,
    pub sar_af_step: f64,
    pub sar_af_max: f64,
    /// Bollinger Bands period
    pub bb_period: usize,
    /// Bollinger Bands width in standard deviations
    pub bb_multiplier: f64,
    /// ATR period
    pub atr_period: usize,
    /// Window used by every divergence check
    pub divergence_lookback: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            mfi_period: 14,
            mfi_overbought: 80.0,
            mfi_oversold: 20.0,
            vwao_fast: 10,
            vwao_slow: 30,
            hma_period: 20,
            amdo_period: 10,
            amdo_smoothing: 3,
            amdo_signal: 9,
            atso_fast: 10,
            atso_slow: 30,
            stoch_k_period: 14,
            stoch_d_period: 3,
            stoch_overbought: 80.0,
            stoch_oversold: 20.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            cci_period: 20,
            sar_af_start: 0.02,
            sar_af_step: 0.02,
            sar_af_max: 0.2,
            bb_period: 20,
            bb_multiplier: 2.0,
            atr_period: 14,
            divergence_lookback: 14,
        }
    }
}

impl IndicatorConfig {
    /// Defaults with the shorter periods used by the scalping suite
    pub fn scalping() -> Self {
        Self {
            rsi_period: 7,
            mfi_period: 7,
            hma_period: 9,
            stoch_k_period: 5,
            stoch_d_period: 3,
            macd_fast: 6,
            macd_slow: 13,
            macd_signal: 5,
            cci_period: 14,
            bb_period: 14,
            atr_period: 7,
            divergence_lookback: 10,
            ..Self::default()
        }
    }

    /// Check every oversold/overbought pair.
    ///
    /// Runs before any collaborator is built.
    pub fn validate(&self) -> Result<()> {
        check_band_pair("RSI", self.rsi_oversold, self.rsi_overbought)?;
        check_band_pair("MFI", self.mfi_oversold, self.mfi_overbought)?;
        check_band_pair("Stochastic", self.stoch_oversold, self.stoch_overbought)?;
        Ok(())
    }
}

fn check_band_pair(indicator: &str, oversold: f64, overbought: f64) -> Result<()> {
    for (label, v) in [("oversold", oversold), ("overbought", overbought)] {
        if !v.is_finite() || !(0.0..=100.0).contains(&v) {
            return Err(SuiteError::Config(format!(
                "{indicator} {label} level {v} must lie within [0, 100]"
            )));
        }
    }
    if oversold >= overbought {
        return Err(SuiteError::Config(format!(
            "{indicator} oversold level {oversold} must be below overbought level {overbought}"
        )));
    }
    Ok(())
}

/// Which composition the replay binary builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteKind {
    Standard,
    Scalping,
}

impl Default for SuiteKind {
    fn default() -> Self {
        SuiteKind::Standard
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteKind::Standard => write!(f, "standard"),
            SuiteKind::Scalping => write!(f, "scalping"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    pub kind: SuiteKind,
    /// Use `IndicatorConfig` as given instead of the suite's own tuned set
    pub custom_indicators: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Spacing between samples, used for plot timestamps
    pub interval_secs: u64,
    /// Log the composite signal every N rows (0 disables per-row logging)
    pub log_every: usize,
    /// Write the final plot export as JSON here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_path: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            log_every: 1,
            plot_path: None,
        }
    }
}

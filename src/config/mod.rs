//! Configuration management for the fusion layer
//!
//! Loads serialized defaults, optional TOML/YAML/JSON files and environment
//! variables (after reading .env)

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `FUSION__INDICATORS__RSI_PERIOD=9`
pub const ENV_PREFIX: &str = "FUSION";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub suite: SuiteConfig,
    pub indicators: IndicatorConfig,
    pub replay: ReplayConfig,
}

impl AppConfig {
    /// Load configuration from `config/default`, `config/local` and the
    /// environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    /// Load a single explicit file on top of the defaults (no environment)
    pub fn load_file(path: &Path) -> Result<Self> {
        let config = Self::defaults()?
            .add_source(File::from(path).required(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        Self::finish(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;
        Ok(Config::builder().add_source(defaults))
    }

    fn finish(config: Config) -> Result<Self> {
        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config
            .indicators
            .validate()
            .context("Invalid indicator configuration")?;

        Ok(app_config)
    }

    /// Generate a one-line digest of the config for logging
    pub fn digest(&self) -> String {
        let ind = &self.indicators;
        format!(
            "suite={} custom={} rsi={}/{}/{} mfi={}/{}/{} macd={}/{}/{} lookback={} interval={}s",
            self.suite.kind,
            self.suite.custom_indicators,
            ind.rsi_period,
            ind.rsi_overbought,
            ind.rsi_oversold,
            ind.mfi_period,
            ind.mfi_overbought,
            ind.mfi_oversold,
            ind.macd_fast,
            ind.macd_slow,
            ind.macd_signal,
            ind.divergence_lookback,
            self.replay.interval_secs,
        )
    }

    /// Indicator parameters the configured suite is actually built with
    pub fn effective_indicators(&self) -> IndicatorConfig {
        match (self.suite.kind, self.suite.custom_indicators) {
            (SuiteKind::Scalping, false) => IndicatorConfig::scalping(),
            _ => self.indicators.clone(),
        }
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

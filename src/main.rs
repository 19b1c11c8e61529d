//! signal-replay - feed an OHLCV CSV through a suite
//!
//! Usage: signal-replay <samples.csv> [signals.csv]
//!
//! Configuration comes from `config/default`, `config/local` and `FUSION__*`
//! environment variables. The final divergence map is printed as JSON.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use signal_fusion::config::{AppConfig, SuiteKind};
use signal_fusion::error::SuiteError;
use signal_fusion::persistence::{load_samples, SignalRecord, SignalWriter};
use signal_fusion::suite::{ScalpingSuite, SignalSuite, StandardSuite};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: signal-replay <samples.csv> [signals.csv]";

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let samples_path = args.next().context(USAGE)?;
    let signals_path = args.next();

    let config = AppConfig::load()?;
    info!(config = %config.digest(), "Starting replay");

    let mut suite = build_suite(&config)?;
    let records = load_samples(Path::new(&samples_path))?;
    let mut writer = signals_path
        .as_deref()
        .map(|p| SignalWriter::create(Path::new(p)))
        .transpose()?;

    let log_every = config.replay.log_every;
    let mut rejected = 0usize;

    for (row, record) in records.iter().enumerate() {
        match suite.add(&record.sample()) {
            Ok(()) => {}
            Err(SuiteError::InvalidSample(reason)) => {
                warn!(row = row + 1, %reason, "Skipping invalid sample");
                rejected += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Replay failed at row {}", row + 1)),
        }

        let signal = suite
            .combined_signal()
            .with_context(|| format!("Fusion query failed at row {}", row + 1))?;
        if log_every > 0 && (row + 1) % log_every == 0 {
            info!(row = row + 1, timestamp = record.timestamp, %signal, "Composite signal");
        }

        if let Some(writer) = writer.as_mut() {
            let divergences = suite.divergence_signals()?;
            writer.write(&SignalRecord::new(
                record.timestamp,
                suite.kind(),
                signal,
                &divergences,
            ))?;
        }
    }

    if let Some(plot_path) = &config.replay.plot_path {
        let start = records
            .first()
            .and_then(|r| r.datetime())
            .unwrap_or_else(Utc::now);
        let interval = Duration::seconds(config.replay.interval_secs as i64);
        let series = suite.plot_data(start, interval);
        let json = serde_json::to_string_pretty(&series).context("Failed to serialize plot data")?;
        fs::write(plot_path, json).with_context(|| format!("Failed to write {}", plot_path))?;
        info!(path = %plot_path, series = series.len(), "Plot data written");
    }

    let divergences: BTreeMap<String, String> = suite
        .divergence_signals()?
        .into_iter()
        .map(|(name, divergence)| (name, divergence.to_string()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&divergences)?);

    info!(
        suite = suite.kind(),
        rows = records.len(),
        accepted = suite.samples_seen(),
        rejected,
        written = writer.as_ref().map(|w| w.written()).unwrap_or(0),
        "Replay complete"
    );

    Ok(())
}

fn build_suite(config: &AppConfig) -> Result<Box<dyn SignalSuite>> {
    let indicators = config.effective_indicators();
    let suite: Box<dyn SignalSuite> = match config.suite.kind {
        SuiteKind::Standard => Box::new(StandardSuite::with_config(indicators)?),
        SuiteKind::Scalping => Box::new(ScalpingSuite::with_config(indicators)?),
    };
    Ok(suite)
}

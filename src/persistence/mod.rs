//! CSV Persistence Module
//!
//! Loads OHLCV samples for replay and appends composite signals for analysis

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{info, warn};

use crate::suite::DivergenceReport;
use crate::types::{CompositeSignal, Sample};

/// One OHLCV row (`timestamp,high,low,close,volume`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Unix time in milliseconds
    pub timestamp: i64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl SampleRecord {
    pub fn sample(&self) -> Sample {
        Sample::new(self.high, self.low, self.close, self.volume)
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Composite signal row written by the replay binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: i64,
    pub suite: String,
    pub signal: String,
    /// `NAME:label` pairs joined by `;`, sorted by name
    #[serde(default)]
    pub divergences: String,
}

impl SignalRecord {
    pub fn new(
        timestamp: i64,
        suite: &str,
        signal: CompositeSignal,
        divergences: &DivergenceReport,
    ) -> Self {
        let mut pairs: Vec<String> = divergences
            .iter()
            .map(|(name, divergence)| format!("{}:{}", name, divergence))
            .collect();
        pairs.sort();

        Self {
            timestamp,
            suite: suite.to_string(),
            signal: signal.to_string(),
            divergences: pairs.join(";"),
        }
    }
}

/// Load every sample row from a headed CSV file
pub fn load_samples(path: &Path) -> Result<Vec<SampleRecord>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open sample file {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: SampleRecord = result
            .with_context(|| format!("Failed to deserialize sample record at row {}", row + 1))?;
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "Loaded samples");
    Ok(records)
}

/// Read back a signal file
pub fn load_signals(path: &Path) -> Result<Vec<SignalRecord>> {
    let file = fs::File::open(path).context("Failed to open signal file")?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: SignalRecord = result.context("Failed to deserialize signal record")?;
        records.push(record);
    }
    Ok(records)
}

/// Appending signal CSV writer; headers are written only to an empty file
pub struct SignalWriter {
    writer: csv::Writer<fs::File>,
    written: usize,
}

impl SignalWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create signal directory")?;
        }
        let file_has_data =
            path.exists() && fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        if file_has_data {
            warn!(path = %path.display(), "Appending to existing signal file");
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context("Failed to open CSV file")?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, record: &SignalRecord) -> Result<()> {
        self.writer
            .serialize(record)
            .context("Failed to write signal record")?;
        self.writer
            .flush()
            .context("Failed to flush signal writer")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

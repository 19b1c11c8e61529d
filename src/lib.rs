//! Signal Fusion Library
//!
//! Streams OHLCV samples through fixed sets of technical indicators and fuses
//! their crossover, zone, trend and divergence views into one composite
//! trading bias.

pub mod config;
pub mod error;
pub mod fusion;
pub mod indicators;
pub mod persistence;
pub mod suite;
pub mod types;

pub use config::{AppConfig, IndicatorConfig, SuiteKind};
pub use error::{IndicatorError, SuiteError};
pub use suite::{DivergenceReport, ScalpingSuite, SignalSuite, StandardSuite};
pub use types::{CompositeSignal, Divergence, PlotSeries, Sample};

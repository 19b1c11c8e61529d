//! Continuous bull/bear score for the scalping suite
//!
//! Every reading may add to the bullish side, the bearish side, or both. The
//! net score is classified against thresholds that move with volatility:
//! expanding volatility lowers them, contracting volatility raises them.

use serde::Serialize;
use tracing::debug;

use crate::indicators::Bands;
use crate::types::{Bias, CompositeSignal, Trend, Zone};

const CROSS_POINTS: f64 = 1.0;
const MACD_CROSS_POINTS: f64 = 1.1;
const OSCILLATOR_ZONE_POINTS: f64 = 0.5;
const STOCH_ZONE_POINTS: f64 = 0.35;
const STOCH_EXTREME_POINTS: f64 = 0.4;
const STOCH_LOW: f64 = 25.0;
const STOCH_HIGH: f64 = 75.0;
const CCI_EXTREME_POINTS: f64 = 0.45;
const CCI_EXTREME: f64 = 90.0;
const CONFIRM_POINTS: f64 = 0.3;
const SAR_POINTS: f64 = 0.5;
const BAND_TOUCH_POINTS: f64 = 0.6;
const ATR_POINTS: f64 = 0.3;
const ATR_ACCEL_POINTS: f64 = 0.5;
const ATR_ACCEL_CHANGE: f64 = 0.05;
const VWAP_POINTS: f64 = 0.35;
const MOMENTUM_POINTS: f64 = 0.2;

const HIGH_VOLATILITY_RATIO: f64 = 0.004;
const LOW_VOLATILITY_RATIO: f64 = 0.0015;

/// Crossover flags read from one collaborator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Crossing {
    pub bullish: bool,
    pub bearish: bool,
}

impl Crossing {
    pub fn new(bullish: bool, bearish: bool) -> Self {
        Self { bullish, bearish }
    }
}

/// Snapshot of every collaborator view the score reads
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScalpingReadings {
    pub rsi_cross: Crossing,
    pub rsi_zone: Zone,
    pub stoch_cross: Crossing,
    pub stoch_zone: Zone,
    pub stoch_k: Option<f64>,
    pub macd_cross: Crossing,
    pub macd_trend: Trend,
    pub cci_cross: Crossing,
    pub cci: Option<f64>,
    pub hma_cross: Crossing,
    pub hma_trend: Trend,
    pub sar_uptrend: Option<bool>,
    pub bands: Option<Bands>,
    pub atr: Option<f64>,
    pub prev_atr: Option<f64>,
    pub vwap: Option<f64>,
    pub mfi_cross: Crossing,
    pub mfi_zone: Zone,
    pub last_close: Option<f64>,
    pub prev_close: Option<f64>,
}

impl ScalpingReadings {
    /// Latest ATR relative to the latest close
    pub fn volatility_ratio(&self) -> Option<f64> {
        match (self.atr, self.last_close) {
            (Some(atr), Some(close)) if close > 0.0 => Some(atr / close),
            _ => None,
        }
    }
}

/// One scored item of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub source: &'static str,
    pub bias: Bias,
    pub points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub bull: f64,
    pub bear: f64,
    pub contributions: Vec<Contribution>,
}

impl Score {
    pub fn net(&self) -> f64 {
        self.bull - self.bear
    }

    fn add(&mut self, source: &'static str, bias: Bias, points: f64) {
        match bias {
            Bias::Bullish => self.bull += points,
            Bias::Bearish => self.bear += points,
        }
        self.contributions.push(Contribution {
            source,
            bias,
            points,
        });
    }

    fn crossing(&mut self, source: &'static str, crossing: Crossing, points: f64) {
        if crossing.bullish {
            self.add(source, Bias::Bullish, points);
        }
        if crossing.bearish {
            self.add(source, Bias::Bearish, points);
        }
    }

    fn zone(&mut self, source: &'static str, zone: Zone, points: f64) {
        match zone {
            Zone::Oversold => self.add(source, Bias::Bullish, points),
            Zone::Overbought => self.add(source, Bias::Bearish, points),
            Zone::Neutral => {}
        }
    }

    fn trend(&mut self, source: &'static str, trend: Trend, points: f64) {
        match trend {
            Trend::Bullish => self.add(source, Bias::Bullish, points),
            Trend::Bearish => self.add(source, Bias::Bearish, points),
            Trend::Neutral => {}
        }
    }

    fn direction(&mut self, source: &'static str, current: f64, reference: f64, points: f64) {
        if current > reference {
            self.add(source, Bias::Bullish, points);
        } else if current < reference {
            self.add(source, Bias::Bearish, points);
        }
    }
}

/// Score every reading
pub fn score(r: &ScalpingReadings) -> Score {
    let mut s = Score::default();

    s.crossing("RSI", r.rsi_cross, CROSS_POINTS);
    s.zone("RSI", r.rsi_zone, OSCILLATOR_ZONE_POINTS);

    s.crossing("Stochastic", r.stoch_cross, CROSS_POINTS);
    s.zone("Stochastic", r.stoch_zone, STOCH_ZONE_POINTS);
    match r.stoch_k {
        Some(k) if k < STOCH_LOW => s.add("Stochastic", Bias::Bullish, STOCH_EXTREME_POINTS),
        Some(k) if k > STOCH_HIGH => s.add("Stochastic", Bias::Bearish, STOCH_EXTREME_POINTS),
        _ => {}
    }

    s.crossing("MACD", r.macd_cross, MACD_CROSS_POINTS);
    s.trend("MACD", r.macd_trend, CONFIRM_POINTS);

    s.crossing("CCI", r.cci_cross, CROSS_POINTS);
    match r.cci {
        Some(v) if v < -CCI_EXTREME => s.add("CCI", Bias::Bullish, CCI_EXTREME_POINTS),
        Some(v) if v > CCI_EXTREME => s.add("CCI", Bias::Bearish, CCI_EXTREME_POINTS),
        _ => {}
    }

    s.crossing("HMA", r.hma_cross, CROSS_POINTS);
    s.trend("HMA", r.hma_trend, CONFIRM_POINTS);

    match r.sar_uptrend {
        Some(true) => s.add("SAR", Bias::Bullish, SAR_POINTS),
        Some(false) => s.add("SAR", Bias::Bearish, SAR_POINTS),
        None => {}
    }

    if let (Some(bands), Some(close)) = (r.bands, r.last_close) {
        if close <= bands.lower {
            s.add("Bollinger", Bias::Bullish, BAND_TOUCH_POINTS);
        }
        if close >= bands.upper {
            s.add("Bollinger", Bias::Bearish, BAND_TOUCH_POINTS);
        }
    }

    // Volatility confirms a move only when it travels with price
    if let (Some(atr), Some(prev_atr), Some(close), Some(prev_close)) =
        (r.atr, r.prev_atr, r.last_close, r.prev_close)
    {
        let change = if prev_atr > 0.0 {
            (atr - prev_atr).abs() / prev_atr
        } else {
            0.0
        };
        let points = if change > ATR_ACCEL_CHANGE {
            ATR_ACCEL_POINTS
        } else {
            ATR_POINTS
        };
        if atr > prev_atr && close > prev_close {
            s.add("ATR", Bias::Bullish, points);
        } else if atr < prev_atr && close < prev_close {
            s.add("ATR", Bias::Bearish, points);
        }
    }

    if let (Some(vwap), Some(close)) = (r.vwap, r.last_close) {
        s.direction("VWAP", close, vwap, VWAP_POINTS);
    }

    s.crossing("MFI", r.mfi_cross, CROSS_POINTS);
    s.zone("MFI", r.mfi_zone, OSCILLATOR_ZONE_POINTS);

    if let (Some(close), Some(prev)) = (r.last_close, r.prev_close) {
        s.direction("Momentum", close, prev, MOMENTUM_POINTS);
    }

    s
}

/// Strong/normal/weak magnitudes, applied symmetrically to both sides
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptiveThresholds {
    pub strong: f64,
    pub normal: f64,
    pub weak: f64,
}

impl AdaptiveThresholds {
    pub const BASE: AdaptiveThresholds = AdaptiveThresholds {
        strong: 2.4,
        normal: 1.4,
        weak: 0.6,
    };

    const SHIFT: AdaptiveThresholds = AdaptiveThresholds {
        strong: 0.2,
        normal: 0.15,
        weak: 0.1,
    };

    /// Both band edges are exclusive; `None` keeps the base values
    pub fn for_volatility_ratio(ratio: Option<f64>) -> Self {
        let base = Self::BASE;
        let shift = Self::SHIFT;
        match ratio {
            Some(r) if r > HIGH_VOLATILITY_RATIO => Self {
                strong: base.strong - shift.strong,
                normal: base.normal - shift.normal,
                weak: base.weak - shift.weak,
            },
            Some(r) if r < LOW_VOLATILITY_RATIO => Self {
                strong: base.strong + shift.strong,
                normal: base.normal + shift.normal,
                weak: base.weak + shift.weak,
            },
            _ => base,
        }
    }
}

impl Default for AdaptiveThresholds {
    fn default() -> Self {
        Self::BASE
    }
}

/// Bullish bands are checked before bearish ones
pub fn classify(net: f64, t: &AdaptiveThresholds) -> CompositeSignal {
    if net >= t.strong {
        CompositeSignal::StrongBullish
    } else if net >= t.normal {
        CompositeSignal::Bullish
    } else if net >= t.weak {
        CompositeSignal::WeakBullish
    } else if net <= -t.strong {
        CompositeSignal::StrongBearish
    } else if net <= -t.normal {
        CompositeSignal::Bearish
    } else if net <= -t.weak {
        CompositeSignal::WeakBearish
    } else {
        CompositeSignal::Neutral
    }
}

/// Score a snapshot and classify it against volatility-adjusted thresholds
pub fn evaluate(readings: &ScalpingReadings) -> CompositeSignal {
    let score = score(readings);
    let ratio = readings.volatility_ratio();
    let thresholds = AdaptiveThresholds::for_volatility_ratio(ratio);
    let signal = classify(score.net(), &thresholds);

    debug!(
        bull = score.bull,
        bear = score.bear,
        net = score.net(),
        volatility_ratio = ?ratio,
        strong = thresholds.strong,
        contributions = score.contributions.len(),
        %signal,
        "scalping score"
    );

    signal
}

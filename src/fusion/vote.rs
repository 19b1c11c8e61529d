//! Weighted crossover vote
//!
//! Each voter adds its weight when it reports a crossover for the queried
//! bias. A single voter can never move the label off Neutral, whatever its
//! weight.

use tracing::debug;

use crate::error::{Result, SuiteError};
use crate::indicators::CrossoverSignal;
use crate::types::{Bias, CompositeSignal};

const STRONG_SUM: f64 = 1.5;
const NORMAL_SUM: f64 = 1.0;
const MIN_VOTERS: usize = 2;

/// Fixed per-collaborator weights, shared by both directions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardWeights {
    pub rsi: f64,
    pub mfi: f64,
    pub vwao: f64,
    pub hma: f64,
    pub amdo: f64,
    pub atso: f64,
}

impl StandardWeights {
    pub const DEFAULT: StandardWeights = StandardWeights {
        rsi: 1.0,
        mfi: 1.2,
        vwao: 1.0,
        hma: 1.5,
        amdo: 0.8,
        atso: 0.5,
    };
}

impl Default for StandardWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A collaborator taking part in the vote through its fallible crossover query
pub struct Voter<'a> {
    pub name: &'static str,
    pub weight: f64,
    pub source: &'a dyn CrossoverSignal,
}

impl<'a> Voter<'a> {
    pub fn new(name: &'static str, weight: f64, source: &'a dyn CrossoverSignal) -> Self {
        Self {
            name,
            weight,
            source,
        }
    }
}

/// Running weighted sum and count of triggered voters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    pub sum: f64,
    pub count: usize,
    pub triggered: Vec<&'static str>,
}

impl VoteTally {
    pub fn record(&mut self, name: &'static str, weight: f64) {
        self.sum += weight;
        self.count += 1;
        self.triggered.push(name);
    }
}

/// Query every voter for the given bias, stopping at the first failure
pub fn tally_crossovers(voters: &[Voter<'_>], bias: Bias) -> Result<VoteTally> {
    let mut tally = VoteTally::default();

    for voter in voters {
        let fired = match bias {
            Bias::Bullish => voter.source.is_bullish_crossover(),
            Bias::Bearish => voter.source.is_bearish_crossover(),
        }
        .map_err(|source| {
            debug!(indicator = voter.name, %bias, error = %source, "crossover query failed");
            SuiteError::Query {
                indicator: voter.name,
                source,
            }
        })?;

        if fired {
            tally.record(voter.name, voter.weight);
        }
    }

    Ok(tally)
}

/// Map a tally onto the label set, first match wins
pub fn classify(tally: &VoteTally, bias: Bias) -> CompositeSignal {
    if tally.count < MIN_VOTERS {
        return CompositeSignal::Neutral;
    }

    match (bias, tally.sum) {
        (Bias::Bullish, s) if s >= STRONG_SUM => CompositeSignal::StrongBullish,
        (Bias::Bullish, s) if s >= NORMAL_SUM => CompositeSignal::Bullish,
        (Bias::Bullish, s) if s > 0.0 => CompositeSignal::WeakBullish,
        (Bias::Bearish, s) if s >= STRONG_SUM => CompositeSignal::StrongBearish,
        (Bias::Bearish, s) if s >= NORMAL_SUM => CompositeSignal::Bearish,
        (Bias::Bearish, s) if s > 0.0 => CompositeSignal::WeakBearish,
        _ => CompositeSignal::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndicatorError;
    use mockall::mock;

    mock! {
        Cross {}
        impl CrossoverSignal for Cross {
            fn is_bullish_crossover(&self) -> std::result::Result<bool, IndicatorError>;
            fn is_bearish_crossover(&self) -> std::result::Result<bool, IndicatorError>;
        }
    }

    fn bullish(fired: bool) -> MockCross {
        let mut mock = MockCross::new();
        mock.expect_is_bullish_crossover().returning(move || Ok(fired));
        mock
    }

    fn tally(sum: f64, count: usize) -> VoteTally {
        VoteTally {
            sum,
            count,
            triggered: Vec::new(),
        }
    }

    #[test]
    fn test_single_voter_stays_neutral() {
        assert_eq!(classify(&tally(1.5, 1), Bias::Bullish), CompositeSignal::Neutral);
        assert_eq!(classify(&tally(9.0, 1), Bias::Bearish), CompositeSignal::Neutral);
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify(&tally(2.5, 2), Bias::Bullish), CompositeSignal::StrongBullish);
        assert_eq!(classify(&tally(1.5, 2), Bias::Bearish), CompositeSignal::StrongBearish);
        assert_eq!(classify(&tally(1.3, 2), Bias::Bullish), CompositeSignal::Bullish);
        assert_eq!(classify(&tally(1.0, 2), Bias::Bearish), CompositeSignal::Bearish);
        assert_eq!(classify(&tally(0.9, 2), Bias::Bullish), CompositeSignal::WeakBullish);
        assert_eq!(classify(&tally(0.0, 2), Bias::Bullish), CompositeSignal::Neutral);
    }

    #[test]
    fn test_tally_counts_triggered_voters() {
        let hma = bullish(true);
        let rsi = bullish(true);
        let mfi = bullish(false);
        let w = StandardWeights::DEFAULT;
        let voters = [
            Voter::new("RSI", w.rsi, &rsi),
            Voter::new("MFI", w.mfi, &mfi),
            Voter::new("HMA", w.hma, &hma),
        ];

        let result = tally_crossovers(&voters, Bias::Bullish).unwrap();
        assert_eq!(result.count, 2);
        assert_eq!(result.sum, 2.5);
        assert_eq!(result.triggered, vec!["RSI", "HMA"]);
        assert_eq!(classify(&result, Bias::Bullish), CompositeSignal::StrongBullish);
    }

    #[test]
    fn test_tally_propagates_first_failure() {
        let ok = bullish(true);
        let mut broken = MockCross::new();
        broken
            .expect_is_bullish_crossover()
            .returning(|| Err(IndicatorError::NonFinite { what: "AMDO" }));
        let mut never = MockCross::new();
        never.expect_is_bullish_crossover().never();

        let voters = [
            Voter::new("RSI", 1.0, &ok),
            Voter::new("AMDO", 0.8, &broken),
            Voter::new("HMA", 1.5, &never),
        ];

        let err = tally_crossovers(&voters, Bias::Bullish).unwrap_err();
        assert_eq!(err.indicator(), Some("AMDO"));
        assert!(matches!(err, SuiteError::Query { .. }));
    }

    #[test]
    fn test_bearish_queries_bearish_side() {
        let mut a = MockCross::new();
        a.expect_is_bearish_crossover().times(1).returning(|| Ok(true));
        a.expect_is_bullish_crossover().never();
        let mut b = MockCross::new();
        b.expect_is_bearish_crossover().times(1).returning(|| Ok(true));

        let voters = [Voter::new("MFI", 1.2, &a), Voter::new("VWAO", 1.0, &b)];
        let result = tally_crossovers(&voters, Bias::Bearish).unwrap();
        assert_eq!(classify(&result, Bias::Bearish), CompositeSignal::StrongBearish);
    }
}

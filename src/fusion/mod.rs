//! Fusion rules - turn collaborator signal views into one composite label
//!
//! Both rules are pure functions over snapshots taken by the suites:
//! - [`vote`]: weighted crossover vote with a two-voter floor (standard suite)
//! - [`score`]: additive bull/bear score with volatility-adaptive
//!   thresholds (scalping suite)

pub mod score;
pub mod vote;

pub use score::{AdaptiveThresholds, Contribution, Crossing, ScalpingReadings, Score};
pub use vote::{StandardWeights, VoteTally, Voter};

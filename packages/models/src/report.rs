//! Run-level report: population statistics and non-fatal conditions.
//!
//! Fatal reference-data problems abort a run before anything is written.
//! Everything else (degenerate quartile bins, parcels outside every noise
//! polygon, unbandable decibel readings) is counted here and shipped next
//! to the complete output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Criterion, MissingNoisePolicy, QuartileRank};

/// Empirical quartile cut points (25th, 50th and 75th percentile) of one
/// criterion's distance distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuartileBoundaries {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

impl QuartileBoundaries {
    /// Rank of `distance` against these cut points.
    ///
    /// Bins are right-inclusive: a value equal to a cut point falls into
    /// the lower bin, and the minimum always lands in the first bin.
    #[must_use]
    pub fn rank(&self, distance: f64) -> QuartileRank {
        if distance <= self.q1 {
            QuartileRank::First
        } else if distance <= self.q2 {
            QuartileRank::Second
        } else if distance <= self.q3 {
            QuartileRank::Third
        } else {
            QuartileRank::Fourth
        }
    }
}

/// A criterion whose distance distribution could not fill four bins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateDistribution {
    pub criterion: Criterion,
    /// Number of distinct distance values in the population.
    pub distinct_values: usize,
    /// Ranks no parcel received.
    pub unreachable_ranks: Vec<QuartileRank>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub parcel_count: usize,
    /// Cut points used for each proximity criterion.
    pub boundaries: BTreeMap<Criterion, QuartileBoundaries>,
    pub degenerate_distributions: Vec<DegenerateDistribution>,
    /// Parcels whose representative point lies outside every noise polygon.
    pub missing_noise: usize,
    /// Parcels whose decibel reading fell outside the bandable range.
    pub out_of_range_decibels: usize,
    pub missing_noise_policy: MissingNoisePolicy,
    /// Number of parcels per composite index value.
    pub index_distribution: BTreeMap<u8, usize>,
}

impl RunReport {
    /// Whether any non-fatal condition was recorded.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.degenerate_distributions.is_empty()
            || self.missing_noise > 0
            || self.out_of_range_decibels > 0
    }
}

//! Stage 2: population quartile ranks.
//!
//! Cut points are the 25th, 50th and 75th percentiles of each criterion's
//! own distance column, recomputed for every criterion and every run.
//! Percentiles interpolate linearly between order statistics at position
//! `p * (n - 1)`. Bins are right-inclusive, so a distance equal to a cut
//! point takes the lower rank, and tied distances always share a rank.

use urban_index_models::{
    Criterion, DegenerateDistribution, PerCriterion, QuartileBoundaries, QuartileRank,
};

use crate::distance::DistanceTable;

/// Ranks and statistics for one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct QuartileColumn {
    pub boundaries: QuartileBoundaries,
    pub ranks: Vec<QuartileRank>,
    /// Set when the distribution could not fill four bins.
    pub degenerate: Option<DegenerateDistribution>,
}

/// Quartile ranks for every criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct QuartileTable {
    columns: PerCriterion<QuartileColumn>,
    parcel_count: usize,
}

impl QuartileTable {
    #[must_use]
    pub fn column(&self, criterion: Criterion) -> &QuartileColumn {
        &self.columns[criterion]
    }

    #[must_use]
    pub const fn parcel_count(&self) -> usize {
        self.parcel_count
    }

    /// Ranks of one parcel across every criterion.
    ///
    /// # Panics
    ///
    /// Panics if `parcel` is out of range.
    #[must_use]
    pub fn row(&self, parcel: usize) -> PerCriterion<QuartileRank> {
        PerCriterion::from_fn(|criterion| self.columns[criterion].ranks[parcel])
    }

    pub fn boundaries(&self) -> impl Iterator<Item = (Criterion, QuartileBoundaries)> + '_ {
        self.columns
            .iter()
            .map(|(criterion, column)| (criterion, column.boundaries))
    }

    pub fn degenerate(&self) -> impl Iterator<Item = &DegenerateDistribution> {
        self.columns
            .iter()
            .filter_map(|(_, column)| column.degenerate.as_ref())
    }
}

/// Ranks every criterion column of `distances`.
#[must_use]
pub fn classify(distances: &DistanceTable) -> QuartileTable {
    let columns = PerCriterion::from_fn(|criterion| {
        let column = classify_column(criterion, distances.column(criterion));
        if let Some(degenerate) = &column.degenerate {
            log::warn!(
                "{criterion}: only {} distinct distances, ranks {:?} unreachable",
                degenerate.distinct_values,
                degenerate
                    .unreachable_ranks
                    .iter()
                    .map(|rank| rank.value())
                    .collect::<Vec<_>>()
            );
        }
        column
    });

    QuartileTable {
        columns,
        parcel_count: distances.parcel_count(),
    }
}

/// Ranks one distance column against its own quartile cut points.
///
/// An empty column yields all-zero boundaries, no ranks, and a degenerate
/// report.
#[must_use]
pub fn classify_column(criterion: Criterion, distances: &[f64]) -> QuartileColumn {
    let mut sorted = distances.to_vec();
    sorted.sort_by(f64::total_cmp);

    let boundaries = boundaries_of_sorted(&sorted).unwrap_or(QuartileBoundaries {
        q1: 0.0,
        q2: 0.0,
        q3: 0.0,
    });
    let ranks: Vec<QuartileRank> = distances.iter().map(|&d| boundaries.rank(d)).collect();

    let mut distinct = sorted;
    distinct.dedup();
    let distinct_values = distinct.len();

    let unreachable_ranks: Vec<QuartileRank> = QuartileRank::ALL
        .into_iter()
        .filter(|rank| !ranks.contains(rank))
        .collect();

    let degenerate = (distinct_values < QuartileRank::ALL.len() || !unreachable_ranks.is_empty())
        .then(|| DegenerateDistribution {
            criterion,
            distinct_values,
            unreachable_ranks,
        });

    QuartileColumn {
        boundaries,
        ranks,
        degenerate,
    }
}

/// Quartile cut points of an unsorted sample, or `None` if it is empty.
#[must_use]
pub fn quartile_boundaries(values: &[f64]) -> Option<QuartileBoundaries> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    boundaries_of_sorted(&sorted)
}

fn boundaries_of_sorted(sorted: &[f64]) -> Option<QuartileBoundaries> {
    Some(QuartileBoundaries {
        q1: quantile_sorted(sorted, 0.25)?,
        q2: quantile_sorted(sorted, 0.50)?,
        q3: quantile_sorted(sorted, 0.75)?,
    })
}

/// Linearly interpolated quantile of an ascending sample.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = p * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
